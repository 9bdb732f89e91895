//! Very simple tool that accepts path in JSON format and reports produced geometry
#![deny(warnings)]

use std::{
    env,
    fs::File,
    io::{BufWriter, Read, Write},
};
use tessellate::*;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

type Error = Box<dyn std::error::Error>;

#[derive(Debug)]
struct Args {
    input_file: String,
    output_file: Option<String>,
    stroke: Option<StrokeStyle>,
    scale: Scalar,
    config: TessellationConfig,
}

fn parse_join(name: &str) -> Result<LineJoin, Error> {
    match name {
        "miter" => Ok(LineJoin::Miter),
        "bevel" => Ok(LineJoin::Bevel),
        "round" => Ok(LineJoin::Round),
        _ => Err(format!("unknown line join: {}", name).into()),
    }
}

fn parse_cap(name: &str) -> Result<LineCap, Error> {
    match name {
        "butt" => Ok(LineCap::Butt),
        "square" => Ok(LineCap::Square),
        "round" => Ok(LineCap::Round),
        _ => Err(format!("unknown line cap: {}", name).into()),
    }
}

impl Args {
    fn parse() -> Result<Args, Error> {
        let mut result = Args {
            input_file: String::new(),
            output_file: None,
            stroke: None,
            scale: 1.0,
            config: TessellationConfig::default(),
        };
        let mut positional = 0;
        let mut args = env::args();
        let cmd = args.next().unwrap_or_else(|| "tessellate".to_owned());
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "-h" => {
                    positional = 0;
                    break;
                }
                "-s" => {
                    let width = args.next().ok_or("-s requires argument")?;
                    let stroke = result.stroke.get_or_insert_with(StrokeStyle::default);
                    stroke.width = width.parse()?;
                }
                "-j" => {
                    let join = parse_join(&args.next().ok_or("-j requires argument")?)?;
                    result.stroke.get_or_insert_with(StrokeStyle::default).line_join = join;
                }
                "-c" => {
                    let cap = parse_cap(&args.next().ok_or("-c requires argument")?)?;
                    result.stroke.get_or_insert_with(StrokeStyle::default).line_cap = cap;
                }
                "-r" => {
                    let ratio: Scalar = args.next().ok_or("-r requires argument")?.parse()?;
                    if ratio <= 0.0 {
                        return Err("pixel ratio must be positive".into());
                    }
                    result.config = TessellationConfig::from_pixel_ratio(ratio);
                }
                "-x" => {
                    result.scale = args.next().ok_or("-x requires argument")?.parse()?;
                }
                "-a" => {
                    result.config = result.config.without_antialiasing();
                }
                _ => {
                    positional += 1;
                    match positional {
                        1 => result.input_file = arg,
                        2 => result.output_file = Some(arg),
                        _ => return Err("unexpected positional argment".into()),
                    }
                }
            }
        }
        if positional < 1 {
            eprintln!(
                "Very simple tool that accepts path in JSON format and reports produced geometry"
            );
            eprintln!("\nUSAGE:");
            eprintln!(
                "    {} [-s <width>] [-j <join>] [-c <cap>] [-r <ratio>] [-x <scale>] [-a] <file.json> [<out.json>]",
                cmd
            );
            eprintln!("\nARGS:");
            eprintln!("    -s <width>         stroke path instead of filling it");
            eprintln!("    -j <join>          line join: miter, bevel or round");
            eprintln!("    -c <cap>           line cap: butt, square or round");
            eprintln!("    -r <ratio>         device pixel ratio");
            eprintln!("    -x <scale>         scale path before tessellation");
            eprintln!("    -a                 disable antialiasing");
            eprintln!("    <file.json>        file containing path commands ('-' means stdin)");
            eprintln!("    <out.json>         vertices of each sub-path ('-' means stdout)");
            std::process::exit(1);
        }
        Ok(result)
    }
}

/// Load path from the file
fn path_load(path: &str) -> Result<Path, Error> {
    let mut contents = String::new();
    if path != "-" {
        let mut file = File::open(path)?;
        file.read_to_string(&mut contents)?;
    } else {
        std::io::stdin().read_to_string(&mut contents)?;
    }
    Ok(tracing::debug_span!("[parse]").in_scope(|| serde_json::from_str(&contents))?)
}

#[derive(serde::Serialize)]
struct SubpathOutput<'a> {
    closed: bool,
    convex: bool,
    winding: Winding,
    fill: &'a [Vertex],
    stroke: &'a [Vertex],
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;
    let path = path_load(&args.input_file)?;
    tracing::debug!("[path:commands] {}", path.commands().len());

    let tr = Transform::identity().scale(args.scale, args.scale);
    let mut cache = PathCache::new();
    cache.flatten(&path, tr, &args.config)?;
    match &args.stroke {
        Some(style) => cache.expand_stroke_style(style, &args.config)?,
        None => {
            cache.expand_fill_config(&args.config)?;
        }
    }

    let (mut fill, mut stroke) = (0, 0);
    for subpath in cache.subpaths() {
        fill += subpath.fill().len();
        stroke += subpath.stroke().len();
    }
    eprintln!(
        "subpaths: {} convex: {} bounds: {:?}",
        cache.subpaths().len(),
        cache.is_convex(),
        cache.bounds()
    );
    eprintln!("fill vertices: {} stroke vertices: {}", fill, stroke);

    if let Some(output_file) = args.output_file {
        let output: Vec<_> = cache
            .subpaths()
            .iter()
            .map(|subpath| SubpathOutput {
                closed: subpath.is_closed(),
                convex: subpath.is_convex(),
                winding: subpath.winding(),
                fill: subpath.fill(),
                stroke: subpath.stroke(),
            })
            .collect();
        let _guard = tracing::debug_span!("[save]").entered();
        if output_file != "-" {
            let mut file = BufWriter::new(File::create(output_file)?);
            serde_json::to_writer(&mut file, &output)?;
            file.flush()?;
        } else {
            let stdout = std::io::stdout();
            let mut handle = BufWriter::new(stdout.lock());
            serde_json::to_writer(&mut handle, &output)?;
            handle.flush()?;
        }
    }

    Ok(())
}
