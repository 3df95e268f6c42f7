/// Setup an in-memory deployment.
pub mod setup;

mod settlement;


mod referral;

mod transfer;

mod entry;
