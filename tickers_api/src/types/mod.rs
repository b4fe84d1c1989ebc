mod page;
pub use self::page::TickersPage;

mod ticker;
pub use self::ticker::TickerRecord;
