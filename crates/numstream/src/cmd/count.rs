use numstream::{consume, Histogram};
use numstream_client::{ClientConfig, SequenceClient};
use numstream_frame::LineConfig;
use numstream_transport::TransportConfig;
use tracing::{info, warn};

use crate::cmd::{parse_duration, CountArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_line, render_count, CountReport, OutputFormat, ValueCount};

pub fn run(args: CountArgs, format: OutputFormat) -> CliResult<i32> {
    let transport = TransportConfig {
        connect_timeout: args.connect_timeout.as_deref().map(parse_duration).transpose()?,
        read_timeout: args.read_timeout.as_deref().map(parse_duration).transpose()?,
        ..TransportConfig::default()
    };
    let line = match args.max_line_length {
        0 => LineConfig::default(),
        max => LineConfig::bounded(max),
    };
    let client = SequenceClient::new(ClientConfig {
        transport,
        line,
        ..ClientConfig::new(args.host, args.port)
    });
    let limit = u64::try_from(args.limit).unwrap_or(0);

    let mut histogram = Histogram::new();
    let measurement = match consume(&client, args.seed, limit, &mut histogram) {
        Ok(measurement) => measurement,
        Err(err) => {
            warn!(recorded = histogram.total(), "sequence aborted");
            return Err(client_error("count failed", err));
        }
    };

    info!(
        seed = args.seed,
        items = measurement.items,
        distinct = histogram.distinct(),
        "count finished"
    );

    let report = CountReport {
        seed: args.seed,
        limit,
        items: measurement.items,
        distinct: histogram.distinct(),
        elapsed_ms: measurement.elapsed.as_millis(),
        throughput: measurement.throughput(),
        top: histogram
            .top(args.top)
            .into_iter()
            .map(|(value, count)| ValueCount { value, count })
            .collect(),
    };
    print_line(&render_count(&report, format))?;
    Ok(SUCCESS)
}
