//! `BookRegistry`: the generalized `EngineStore<T>` plus the drawdown
//! tracking the original engine-isolation layer left to callers.
//!
//! A book's running PnL and its peak are tracked here rather than on
//! `Book` itself (`gk-schemas` types stay plain data); when realized
//! drawdown breaches `max_drawdown_limit_pct` the book is flipped to
//! `Halted` and stays that way until an operator resets it.

use std::collections::HashMap;

use gk_schemas::venue::{Book, BookStatus, BookType};

#[derive(Debug, Clone, Default)]
struct BookLedger {
    realized_pnl_usd: f64,
    peak_pnl_usd: f64,
}

impl BookLedger {
    fn apply_pnl(&mut self, pnl: f64) -> f64 {
        self.realized_pnl_usd += pnl;
        if self.realized_pnl_usd > self.peak_pnl_usd {
            self.peak_pnl_usd = self.realized_pnl_usd;
        }
        self.drawdown_pct()
    }

    fn drawdown_pct(&self) -> f64 {
        if self.peak_pnl_usd <= 0.0 {
            return 0.0;
        }
        ((self.peak_pnl_usd - self.realized_pnl_usd) / self.peak_pnl_usd).max(0.0)
    }
}

#[derive(Debug, Default)]
pub struct BookRegistry {
    books: HashMap<String, Book>,
    ledgers: HashMap<String, BookLedger>,
}

impl BookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, book: Book) {
        self.ledgers.entry(book.id.clone()).or_default();
        self.books.insert(book.id.clone(), book);
    }

    pub fn get(&self, id: &str) -> Option<&Book> {
        self.books.get(id)
    }

    pub fn update_exposure(&mut self, id: &str, exposure_usd: f64) {
        if let Some(book) = self.books.get_mut(id) {
            book.current_exposure_usd = exposure_usd;
        }
    }

    /// Apply a fill's realized PnL to a book's ledger. If the resulting
    /// drawdown breaches the book's own limit, the book is halted and
    /// `true` is returned; halting one book never touches any other
    /// book's ledger or status.
    pub fn apply_pnl(&mut self, id: &str, pnl: f64) -> bool {
        let Some(ledger) = self.ledgers.get_mut(id) else { return false };
        let drawdown_pct = ledger.apply_pnl(pnl);

        let Some(book) = self.books.get_mut(id) else { return false };
        if drawdown_pct > book.max_drawdown_limit_pct {
            book.status = BookStatus::Halted;
            true
        } else {
            false
        }
    }

    /// Administrative reset out of a drawdown halt.
    pub fn reset_halt(&mut self, id: &str) {
        if let Some(book) = self.books.get_mut(id) {
            book.status = BookStatus::Active;
        }
        if let Some(ledger) = self.ledgers.get_mut(id) {
            *ledger = BookLedger::default();
        }
    }

    /// Total current exposure across every book whose type is not
    /// `excluded`. The only way to compute a cross-book aggregate in this
    /// crate — there is no "aggregate everything" method — so a MEME
    /// book's exposure can never accidentally land in another book's
    /// risk budget.
    pub fn aggregate_exposure_excluding(&self, excluded: BookType) -> f64 {
        self.books.values().filter(|b| b.book_type != excluded).map(|b| b.current_exposure_usd).sum()
    }

    pub fn aggregate_capital_excluding(&self, excluded: BookType) -> f64 {
        self.books.values().filter(|b| b.book_type != excluded).map(|b| b.capital_allocated_usd).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_schemas::venue::RiskTier;

    fn book(id: &str, book_type: BookType, capital: f64) -> Book {
        Book {
            id: id.to_string(),
            book_type,
            capital_allocated_usd: capital,
            current_exposure_usd: 0.0,
            max_drawdown_limit_pct: 0.20,
            risk_tier: RiskTier::Standard,
            status: BookStatus::Active,
        }
    }

    #[test]
    fn unregistered_book_lookups_miss_cleanly() {
        let registry = BookRegistry::new();
        assert!(registry.get("hedge-1").is_none());
    }

    #[test]
    fn drawdown_breach_halts_only_that_book() {
        let mut registry = BookRegistry::new();
        registry.register(book("hedge-1", BookType::Hedge, 100_000.0));
        registry.register(book("meme-1", BookType::Meme, 10_000.0));

        registry.apply_pnl("meme-1", 1_000.0);
        let halted = registry.apply_pnl("meme-1", -1_000.0); // 100% drawdown from peak

        assert!(halted);
        assert_eq!(registry.get("meme-1").unwrap().status, BookStatus::Halted);
        assert_eq!(registry.get("hedge-1").unwrap().status, BookStatus::Active);
    }

    #[test]
    fn aggregate_exposure_excludes_requested_type() {
        let mut registry = BookRegistry::new();
        registry.register(book("hedge-1", BookType::Hedge, 100_000.0));
        registry.register(book("meme-1", BookType::Meme, 10_000.0));
        registry.update_exposure("hedge-1", 40_000.0);
        registry.update_exposure("meme-1", 9_000.0);

        assert_eq!(registry.aggregate_exposure_excluding(BookType::Meme), 40_000.0);
        assert_eq!(registry.aggregate_capital_excluding(BookType::Meme), 100_000.0);
    }

    #[test]
    fn reset_halt_clears_status_and_ledger() {
        let mut registry = BookRegistry::new();
        registry.register(book("meme-1", BookType::Meme, 10_000.0));
        registry.apply_pnl("meme-1", 1_000.0);
        registry.apply_pnl("meme-1", -1_000.0);
        assert_eq!(registry.get("meme-1").unwrap().status, BookStatus::Halted);

        registry.reset_halt("meme-1");
        assert_eq!(registry.get("meme-1").unwrap().status, BookStatus::Active);
    }
}
