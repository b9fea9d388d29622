use crate::{BazarError, Result, CATALOG_LOG_NAME, ORDERS_LOG_NAME};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// A single catalog entry. Quantity is signed: this layer applies deltas
/// without a floor, so stock can go negative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub topic: String,
    pub quantity: i64,
    pub price: f64,
}

/// Projection of a [`Book`] returned by topic searches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookSummary {
    pub id: u64,
    pub title: String,
}

/// A row in the order ledger. Rows are append-only and never mutated after
/// insertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_id: u64,
    pub item_id: u64,
    pub quantity: i64,
    pub timestamp: String,
}

/// Book store backed by an append-only log of bincode-framed records.
///
/// The in-memory index is rebuilt by replaying the log on open, with the
/// last record for an id winning. Every mutation appends the full updated
/// record before the index is touched.
#[derive(Clone, Debug)]
pub struct BookStore {
    pub log_location: PathBuf,
    writer: Arc<Mutex<File>>,
    books: Arc<DashMap<u64, Book>>,
}

impl BookStore {
    /// Open a store at the given path, creating the log file if absent.
    /// An empty store is seeded with the default catalog.
    pub fn open<P>(path: P) -> Result<BookStore>
    where
        P: Into<PathBuf>,
    {
        let mut path = path.into();
        if path.is_dir() {
            path = path.join(CATALOG_LOG_NAME);
        }

        let books = DashMap::new();
        replay(&path, |book: Book| {
            books.insert(book.id, book);
        })?;

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let store = BookStore {
            log_location: path,
            writer: Arc::new(Mutex::new(file)),
            books: Arc::new(books),
        };

        if store.books.is_empty() {
            info!("Empty catalog, seeding default books");
            for book in seed_books() {
                store.insert(book)?;
            }
        }
        Ok(store)
    }

    /// Retrieve a book by id. Returns [`None`] if the id is unknown.
    pub fn get(&self, id: u64) -> Option<Book> {
        self.books.get(&id).map(|b| b.value().clone())
    }

    /// Insert or overwrite a book record.
    pub fn insert(&self, book: Book) -> Result<()> {
        self.append(&book)?;
        self.books.insert(book.id, book);
        Ok(())
    }

    /// Apply a signed quantity delta to a book. An unknown id is a no-op,
    /// matching an UPDATE that matches no row.
    pub fn apply_delta(&self, id: u64, delta: i64) -> Result<()> {
        let updated = match self.books.get(&id) {
            Some(book) => {
                let mut book = book.value().clone();
                book.quantity += delta;
                book
            }
            None => {
                debug!(id, "Delta for unknown book, ignoring");
                return Ok(());
            }
        };
        debug!(id, delta, quantity = updated.quantity, "Applied stock delta");
        self.append(&updated)?;
        self.books.insert(id, updated);
        Ok(())
    }

    /// All books matching a topic, ordered by id.
    pub fn search(&self, topic: &str) -> Vec<BookSummary> {
        let mut matches: Vec<BookSummary> = self
            .books
            .iter()
            .filter(|b| b.topic == topic)
            .map(|b| BookSummary {
                id: b.id,
                title: b.title.clone(),
            })
            .collect();
        matches.sort_by_key(|b| b.id);
        matches
    }

    fn append(&self, book: &Book) -> Result<()> {
        let mut file = self.writer.lock().unwrap();
        bincode::serialize_into(&mut *file, book)?;
        file.flush()?;
        Ok(())
    }
}

/// Order ledger backed by an append-only log, one bincode frame per order.
/// Ids are assigned from a process-local counter rebuilt on open.
#[derive(Clone, Debug)]
pub struct OrderStore {
    pub log_location: PathBuf,
    writer: Arc<Mutex<File>>,
    orders: Arc<DashMap<u64, Order>>,
    next_id: Arc<AtomicU64>,
}

impl OrderStore {
    /// Open an order ledger at the given path, creating the log if absent.
    pub fn open<P>(path: P) -> Result<OrderStore>
    where
        P: Into<PathBuf>,
    {
        let mut path = path.into();
        if path.is_dir() {
            path = path.join(ORDERS_LOG_NAME);
        }

        let orders = DashMap::new();
        let mut max_id = 0;
        replay(&path, |order: Order| {
            max_id = max_id.max(order.order_id);
            orders.insert(order.order_id, order);
        })?;

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(OrderStore {
            log_location: path,
            writer: Arc::new(Mutex::new(file)),
            orders: Arc::new(orders),
            next_id: Arc::new(AtomicU64::new(max_id + 1)),
        })
    }

    /// Append a new order row for the given item and return it.
    pub fn record(&self, item_id: u64, quantity: i64) -> Result<Order> {
        let order = Order {
            order_id: self.next_id.fetch_add(1, Ordering::SeqCst),
            item_id,
            quantity,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        {
            let mut file = self.writer.lock().unwrap();
            bincode::serialize_into(&mut *file, &order)?;
            file.flush()?;
        }
        debug!(order_id = order.order_id, item_id, "Recorded order");
        self.orders.insert(order.order_id, order.clone());
        Ok(order)
    }

    /// The full ledger, ordered by order id.
    pub fn all(&self) -> Vec<Order> {
        let mut rows: Vec<Order> = self.orders.iter().map(|o| o.value().clone()).collect();
        rows.sort_by_key(|o| o.order_id);
        rows
    }
}

/// Replay every frame in a log file, ignoring a missing file. A trailing
/// truncated frame surfaces as a serialization error.
fn replay<T, F>(path: &PathBuf, mut apply: F) -> Result<()>
where
    T: DeserializeOwned,
    F: FnMut(T),
{
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let mut reader = BufReader::new(file);
    loop {
        match bincode::deserialize_from(&mut reader) {
            Ok(record) => apply(record),
            Err(e) => match *e {
                bincode::ErrorKind::Io(ref io) if io.kind() == ErrorKind::UnexpectedEof => break,
                _ => return Err(BazarError::Serialization(e)),
            },
        }
    }
    Ok(())
}

fn seed_books() -> Vec<Book> {
    [
        (1, "How to get a good grade in DOS in 40 minutes a day", "distributed systems", 50.0),
        (2, "RPCs for Noobs", "distributed systems", 25.0),
        (3, "Xen and the Art of Surviving Undergraduate School", "undergraduate school", 75.0),
        (4, "Cooking for the Impatient Undergrad", "undergraduate school", 100.0),
        (5, "How to finish Project 3 on time", "project management", 60.0),
        (6, "Why theory classes are so hard", "education", 40.0),
        (7, "Spring in the Pioneer Valley", "travel", 30.0),
    ]
    .into_iter()
    .map(|(id, title, topic, price)| Book {
        id,
        title: title.to_string(),
        topic: topic.to_string(),
        quantity: 10,
        price,
    })
    .collect()
}
