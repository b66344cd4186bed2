pub mod leaderboard;
pub mod milestone_feed;
