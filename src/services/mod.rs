/// Season archival and archived standings reads.
pub mod archive_service;
/// Fixture generation and fixture list reads.
pub mod fixture_service;
/// Health check service.
pub mod health_service;
mod lifecycle;
/// Folding finished matches into the standings.
pub mod match_processor;
/// Round-robin pairing generation.
pub mod pairing;
/// Greedy per-period fixture placement.
pub mod period_scheduler;
/// Full standings rebuild from match history.
pub mod recalculation;
/// Recording set scores of played matches.
pub mod result_service;
/// Season roster registration.
pub mod roster_service;
/// Standings upserts and ranking.
pub mod standings_ledger;
/// Weekday allow-lists.
pub mod weekday;
