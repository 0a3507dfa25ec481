pub mod bidstore;
pub mod completionstore;
pub mod contractstore;
pub mod disputestore;
pub mod escrowstore;
pub mod jobstore;
pub mod reviewstore;
pub mod store;
