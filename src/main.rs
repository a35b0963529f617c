use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;

use chartshot::{
    BrowserKind, ChartRequest, ChartType, PassthroughSource, Pipeline, RenderConfig,
    TemplateStore, Viewport,
};

/// Render a chart description or markup document to a PNG image.
#[derive(Parser, Debug)]
#[command(name = "chartshot", version, about)]
struct Args {
    /// Input file with the chart description or markup ("-" for stdin)
    input: PathBuf,

    /// Output PNG path
    #[arg(short, long, default_value = "chart.png")]
    out: PathBuf,

    /// Explicit chart type (otherwise detected from the input)
    #[arg(long)]
    chart_type: Option<ChartType>,

    /// Template name ("none" disables template styling)
    #[arg(long)]
    template: Option<String>,

    /// File with inline CSS overrides
    #[arg(long)]
    style_file: Option<PathBuf>,

    /// Minimum output width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Minimum output height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Browser engine: chromium, chrome or edge
    #[arg(long, default_value = "chromium")]
    browser: BrowserKind,

    /// Directory of CSS templates
    #[arg(long, default_value = "templates")]
    templates_dir: PathBuf,

    /// Persist the pre-render document here for inspection
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// List available templates and exit
    #[arg(long)]
    list_templates: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let store = TemplateStore::new(&args.templates_dir);
    if args.list_templates {
        for name in store.list() {
            println!("{}", name);
        }
        return Ok(());
    }

    let input_text = if args.input.to_str() == Some("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(&args.input)?
    };

    let inline_style = match &args.style_file {
        Some(path) => Some(fs::read_to_string(path)?),
        None => None,
    };

    let config = RenderConfig {
        browser: args.browser,
        viewport: Viewport {
            width: args.width,
            height: args.height,
        },
        debug_dir: args.debug_dir.clone(),
        ..Default::default()
    };
    let pipeline = Pipeline::new(store, config);

    let mut request = ChartRequest::new(input_text);
    request.chart_type = args.chart_type;
    request.template = args.template.clone();
    request.inline_style = inline_style;
    request.width = args.width;
    request.height = args.height;

    let png = pipeline.generate(&request, &PassthroughSource);
    fs::write(&args.out, &png)?;
    println!("Wrote {} bytes to {}", png.len(), args.out.display());

    Ok(())
}
