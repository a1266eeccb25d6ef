pub mod bluetooth;
pub mod epics;
pub mod logging;
