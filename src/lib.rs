/*
 * Band-RR Scheduling Class
 *
 * A fixed-band, multi-level round-robin scheduling class with
 * starvation-avoidance aging, written for a kernel host but free of any
 * architecture code:
 *
 * - `scheduler::policies::BandRoundRobinPolicy` decides which task runs,
 *   for how long, and when it must give way
 * - `scheduler::SchedulerCore` is a ready-made host layer driving the
 *   policy for one or more scheduling domains
 *
 * The crate is `no_std` and needs only `alloc`. It installs no logger;
 * records go through the `log` facade to whatever the host set up.
 */

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod scheduler;

pub use scheduler::{
    BandRoundRobinPolicy, BandRunQueue, ConfigError, DispatchDecision, DomainId, Priority,
    PriorityBand, ReschedFlags, SchedClass, SchedEvent, SchedHost, SchedTunables, SchedulerCore,
    SwitchInPolicy, TaskId, TimeSliceTicks,
};
