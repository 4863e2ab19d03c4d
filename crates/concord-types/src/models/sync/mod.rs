//! Cause and result tag families of the sync engine, and the reports built
//! from them.

mod cause;
mod report;
mod result;


pub use cause::{
    BanCause, GenericCause, GroupCause, MuteCause, NicknameCause, OnlineRoleCause, SyncCause,
};
pub use report::{EntryOutcome, ResyncFailure, ResyncStatus, ResyncSummary, SyncReport};
pub use result::{
    BanSyncResult, GenericSyncResult, GroupSyncResult, MuteSyncResult, NicknameSyncResult,
    OnlineRoleSyncResult, ResultCategory, SyncResult,
};
