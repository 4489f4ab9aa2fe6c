pub mod types;
pub mod model;
pub mod assign;

pub use types::{Bucket, BucketCounts, BucketId, Person, PersonId};
pub use model::{Board, MoveOutcome};
pub use assign::auto_assign;
