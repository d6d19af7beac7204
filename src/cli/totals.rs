use std::time::Duration;

use clap::Parser;

#[derive(Parser)]
pub struct TotalsArgs {
    /// Pause before requesting each past year, the API is rate-limited.
    #[clap(long, env = "THROTTLE", default_value = "1s")]
    throttle: humantime::Duration,

    /// Never look for measurements before this year.
    #[clap(long, env = "EARLIEST_YEAR", default_value = "2000")]
    pub earliest_year: i32,
}

impl TotalsArgs {
    pub fn throttle(&self) -> Duration {
        *self.throttle
    }
}
