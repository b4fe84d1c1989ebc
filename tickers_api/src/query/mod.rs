mod common;
pub use self::common::{Query, SortDirection};

mod ticker;
pub use self::ticker::TickerQuery;
