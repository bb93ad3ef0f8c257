extern crate ctrlc;
extern crate flexi_logger;
extern crate getopts;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

mod config;
mod departures;
mod geo;
mod layout;
mod mot;
mod mqtt;
mod names;
mod result;
mod scheduler;
mod station;
mod structs;
mod vvo;
mod watcher;
mod weather;

const LOG_ROTATE_BYTES: u64 = 10_000_000;
const LOG_FILES_KEPT: usize = 7;

fn setup_logging(log_dir: Option<String>, verbose: bool) -> result::DashResult<flexi_logger::LoggerHandle> {
    use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming};

    let log_spec = if verbose { "info, vvodash=debug" } else { "info" };
    let logger = Logger::try_with_env_or_str(log_spec)?;
    let logger = match log_dir {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir))
            .rotate(Criterion::Size(LOG_ROTATE_BYTES), Naming::Timestamps, Cleanup::KeepLogFiles(LOG_FILES_KEPT))
            .duplicate_to_stderr(Duplicate::Info),
        None => logger.log_to_stderr(),
    };
    return Ok(logger.format(flexi_logger::detailed_format).start()?);
}

fn parse_number<T: std::str::FromStr>(matches: &getopts::Matches, name: &str, default: T) -> result::DashResult<T> {
    return match matches.opt_str(name) {
        Some(value) => value.parse::<T>()
            .map_err(|_| result::make_error(&format!("--{}: invalid number '{}'", name, value))),
        None => Ok(default),
    };
}

// --station and friends describe a single page, either on top of a config
// file's settings or on their own.
fn page_from_flags(matches: &getopts::Matches) -> result::DashResult<Option<config::PageConfig>> {
    let station = match matches.opt_str("station") {
        Some(station) => station,
        None => return Ok(None),
    };

    return Ok(Some(config::PageConfig{
        id: parse_number(matches, "page", 1)?,
        vvo_id_or_name: station,
        platform: matches.opt_str("platform").filter(|p| !p.trim().is_empty()),
        mot_filter: matches.opt_str("mot")
            .map(|mot| mot.split(',')
                 .map(|token| token.trim().to_string())
                 .filter(|token| !token.is_empty())
                 .collect())
            .unwrap_or_default(),
        line_count: parse_number(matches, "lines", 5)?,
    }));
}

fn load_config(matches: &getopts::Matches) -> result::DashResult<(config::Config, Option<std::path::PathBuf>)> {
    let path = matches.free.first().map(std::path::PathBuf::from);
    let page = page_from_flags(matches)?;

    let config = match (&path, page) {
        (Some(path), None) => {
            let config = config::Config::load(path)?;
            return Ok((config, Some(path.clone())));
        },
        (Some(path), Some(page)) => {
            let mut config = config::Config::load(path)?;
            config.pages = vec![page];
            config
        },
        (None, Some(page)) => config::Config::single_page(page),
        (None, None) => {
            return Err(result::make_error("need a CONFIG file or --station"));
        },
    };
    config.validate()?;
    // Pages come from the command line, so edits to the file can't be applied.
    return Ok((config, None));
}

fn run(matches: &getopts::Matches) -> result::DashResult<()> {
    let one_shot = matches.opt_present("one-shot");
    let (config, watch_path) = load_config(matches)?;
    info!("Running. pages={} one-shot={} prefix={}",
          config.pages.len(), one_shot, config.global_settings.mqtt_topic_prefix);

    let broker = mqtt::Broker{
        host: matches.opt_str("broker").unwrap_or_else(|| "127.0.0.1".to_string()),
        port: parse_number(matches, "port", 1883)?,
        user: matches.opt_str("user"),
        password: matches.opt_str("password"),
    };
    // The broker connection lives for the whole process; the prefix picked
    // here is only used for subscriptions.
    let prefix = config.global_settings.mqtt_topic_prefix.clone();
    let handle = scheduler::SchedulerHandle::new(config);

    let ctrlc_handle = handle.clone();
    ctrlc::set_handler(move || {
        info!("Interrupted, shutting down");
        ctrlc_handle.request_shutdown();
    }).map_err(|err| result::make_error(&format!("Installing Ctrl-C handler: {}", err)))?;

    let (publisher, _listener) = mqtt::connect(&broker, &prefix, handle.clone())?;

    let _watcher = match watch_path {
        Some(ref path) if !one_shot => Some(watcher::watch(path, handle.clone())?),
        _ => None,
    };

    let mut scheduler = scheduler::UpdateScheduler::new(
        handle, station::VvoStationSource::new(), publisher);
    scheduler.run(one_shot);
    scheduler.publisher().disconnect();

    return Ok(());
}

fn print_usage(program: &str, opts: &getopts::Options) {
    let brief = format!("Usage: {} [options] [CONFIG]", program);
    print!("{}", opts.usage(&brief));
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = getopts::Options::new();
    opts.optopt("b", "broker", "MQTT broker host (default 127.0.0.1)", "HOST");
    opts.optopt("p", "port", "MQTT broker port (default 1883)", "PORT");
    opts.optopt("u", "user", "MQTT user name", "USER");
    opts.optopt("P", "password", "MQTT password", "PASSWORD");
    opts.optopt("l", "log-dir", "Write rotating log files to this directory", "DIR");
    opts.optflag("o", "one-shot", "Update every page once and exit");
    opts.optflag("v", "verbose", "Debug logging");
    opts.optflag("h", "help", "Print this help");
    opts.optopt("s", "station", "Show a single station instead of the configured pages", "NAME");
    opts.optopt("", "platform", "Only departures from this platform (with --station)", "PLATFORM");
    opts.optopt("", "mot", "Comma separated transport filter, e.g. tram,bus (with --station)", "LIST");
    opts.optopt("", "page", "Display page for --station (default 1)", "N");
    opts.optopt("", "lines", "Departure rows for --station (default 5)", "N");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(err) => {
            eprintln!("{}", err);
            print_usage(&args[0], &opts);
            std::process::exit(2);
        },
    };
    if matches.opt_present("help") {
        print_usage(&args[0], &opts);
        return;
    }

    let _logger = match setup_logging(matches.opt_str("log-dir"), matches.opt_present("verbose")) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("Logging setup failed: {}", err);
            std::process::exit(1);
        },
    };

    if let Err(err) = run(&matches) {
        error!("{}", err);
        std::process::exit(1);
    }
}
