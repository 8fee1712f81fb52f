use clap::Parser;

/// Terminal dashboard over the World Happiness Report releases.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) JSON file listing the yearly CSV sources. Without it, the files
    /// 2015.csv to 2019.csv are read from the data directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, default data) Where the yearly CSV files live. Overrides the config file.
    #[clap(short, long, value_parser)]
    pub data_dir: Option<String>,

    /// (file path, optional) GeoJSON world outlines used to draw the choropleth map.
    #[clap(short, long, value_parser)]
    pub world: Option<String>,

    /// (year, optional) The year shown first instead of the latest one.
    #[clap(short, long, value_parser)]
    pub year: Option<i32>,

    /// If passed, no terminal UI is started: the plot specifications of the initial state are
    /// written as JSON lines to the standard output.
    #[clap(long, takes_value = false)]
    pub dump: bool,

    /// (file path) Where log records go while the terminal UI is running.
    #[clap(long, value_parser)]
    pub log_file: Option<String>,

    /// If passed as an argument, will turn on verbose logging.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
