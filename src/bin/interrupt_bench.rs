//! 在主机模拟器上运行中断延迟基准测试

use std::process::ExitCode;

use ferrite_event::bench::interrupt_latency::run_on_host;
use ferrite_event::{println_error, println_info};

fn main() -> ExitCode {
    match run_on_host() {
        Ok(report) => {
            println_info!(
                "milestones: {:?}, {} trace records, {} cycles",
                report.milestones,
                report.sim.trace.len(),
                report.sim.cycles
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            println_error!("interrupt benchmark failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
