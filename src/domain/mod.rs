//! Domain model of the remittance gateway: money, partners, the normalized
//! remittance envelope, the audit history and the ports the core talks to.

pub mod history;
pub mod money;
pub mod partner;
pub mod ports;
pub mod remittance;
