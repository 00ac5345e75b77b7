//! Client-state synchronization for list screens.
//!
//! One pattern covers every screen in the dashboard: fetch a collection,
//! display it, mutate through the server, fetch again.  See
//! [`list::ResourceListController`].

pub mod list;

pub use list::{InvalidInput, ListState, Mutation, OnChange, ResourceClient, ResourceListController};
