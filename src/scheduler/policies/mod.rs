/*
 * Scheduling Policies Module
 *
 * Scheduling class implementations. Each one implements the SchedClass
 * trait and is handed to the SchedulerCore at domain initialisation.
 *
 * Available policies:
 * - BandRoundRobin: multi-level round-robin over a fixed priority band,
 *   with aging of starved levels
 */

pub mod band_rr;

pub use band_rr::BandRoundRobinPolicy;
