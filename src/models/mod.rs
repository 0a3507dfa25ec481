pub mod bidmodel;
pub mod completionmodel;
pub mod contractmodel;
pub mod disputemodel;
pub mod escrowmodel;
pub mod jobmodel;
pub mod reviewmodel;
