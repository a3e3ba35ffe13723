//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use foodtoken::{ImportReport, Ledger, LedgerEntry, StudentRecord};
use foodtoken_store::MemoryStore;

/// A test fixture wrapping a memory-backed ledger.
pub struct TestFixture {
    pub ledger: Ledger<MemoryStore>,
}

impl TestFixture {
    /// Create a new fixture with an empty ledger.
    pub fn new() -> Self {
        Self {
            ledger: Ledger::new(MemoryStore::new()),
        }
    }

    /// Create a fixture pre-loaded with the sample roster.
    pub async fn seeded() -> Self {
        let fixture = Self::new();
        fixture
            .ledger
            .import(&sample_roster())
            .await
            .expect("seed import");
        fixture
    }

    /// Issue a single entry, panicking on any failure.
    pub async fn issue(&self, record: &StudentRecord) -> LedgerEntry {
        self.ledger.issue(record).await.expect("issue")
    }

    /// Import a batch and return the report.
    pub async fn import(&self, batch: &[StudentRecord]) -> ImportReport {
        self.ledger.import(batch).await.expect("import")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a record from positional fields.
pub fn record(name: &str, email: &str, usn: &str, class: &str, food: &str) -> StudentRecord {
    StudentRecord::new(name, email, usn, class, food)
}

/// A small roster of realistic registrations, all distinct identities.
pub fn sample_roster() -> Vec<StudentRecord> {
    vec![
        record("Akshay Ks", "akshay.ks.is24@sahyadri.edu.in", "4SF24IS008", "ISE 3A", "Non-Veg"),
        record("Madeeha Zahoor", "madeeha.is23@sahyadri.edu.in", "4SF23IS055", "ISE 5B", "Non-Veg"),
        record("Sinchana S Naik", "sinchanas.ds22@sahyadri.edu.in", "4SF22CD044", "7DS", "Non-Veg"),
        record("Shifa Kouser", "shifakouser8618@gmail.com", "4SF22CD041", "7DS", "Veg"),
        record("Tarun G", "tarun.ds22@sahyadri.edu.in", "4SF22CD053", "7DS", "Non-Veg"),
        record("Rushil", "amin.is23@sahyadri.edu.in", "4SF23IS014", "ISE 5B", "Veg"),
    ]
}
