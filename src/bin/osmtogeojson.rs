use anyhow::{bail, Context, Result};
use osmtogeojson::geojson::Feature;
use osmtogeojson::OsmToGeoJson;
use serde_json::{Map, Value};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use structured_logger::json::new_writer;
use structured_logger::Builder;

enum Format {
    Json,
    Xml,
}

struct Options {
    format: Option<Format>,
    enhanced: bool,
    numeric: bool,
    verbose: bool,
    minify: bool,
    ndjson: bool,
    input: Option<String>,
}

fn print_usage(bin_name: &str) {
    println!(
        "Usage: {} [-f json|xml] [-e] [-n] [-v] [-m] [--ndjson] [FILE]

Converts OSM data (Overpass JSON or OSM XML) to GeoJSON on standard output.
Reads standard input when FILE is - or absent.

  -f FORMAT   input format (json or xml); sniffed from the file extension by default
  -e          enhanced properties: keep nested tags/meta/relations instead of flattening
  -n          coerce numeric-looking property values to JSON numbers
  -v          log warnings about skipped and tainted elements to stderr
  -m          minified output
  --ndjson    newline-delimited GeoJSON, one feature per line
  --version   print the version and exit
  --help      print this help and exit",
        bin_name
    );
}

fn parse_args(args: &[String]) -> Result<Options> {
    let bin_name = args.first().map(String::as_str).unwrap_or("osmtogeojson");
    let mut options = Options {
        format: None,
        enhanced: false,
        numeric: false,
        verbose: false,
        minify: false,
        ndjson: false,
        input: None,
    };
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" => {
                print_usage(bin_name);
                std::process::exit(0);
            }
            "--version" => {
                println!("osmtogeojson {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--ndjson" => options.ndjson = true,
            "-f" | "--format" => {
                let value = match iter.next() {
                    Some(value) => value,
                    None => bail!("{} requires an argument (json or xml)", arg),
                };
                options.format = Some(match value.as_str() {
                    "json" => Format::Json,
                    "xml" | "osm" => Format::Xml,
                    other => bail!("Unsupported format: {}", other),
                });
            }
            "-" => options.input = Some(arg.clone()),
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                for short in flag.chars().skip(1) {
                    match short {
                        'e' => options.enhanced = true,
                        'n' => options.numeric = true,
                        'v' => options.verbose = true,
                        'm' => options.minify = true,
                        other => bail!("Unknown option: -{}", other),
                    }
                }
            }
            other => {
                if options.input.is_some() {
                    bail!("Unexpected argument: {}", other);
                }
                options.input = Some(other.to_string());
            }
        }
    }
    Ok(options)
}

fn sniff_format(input: Option<&str>) -> Format {
    let extension = input.and_then(|path| Path::new(path).extension().and_then(OsStr::to_str));
    match extension {
        Some("osm") | Some("xml") => Format::Xml,
        _ => Format::Json,
    }
}

/// Turns numeric-looking property strings into JSON numbers. Recurses into
/// the nested tags/meta objects in enhanced mode.
fn coerce_numeric(properties: &mut Map<String, Value>, recurse: bool) {
    for value in properties.values_mut() {
        match value {
            Value::String(text) => {
                if let Ok(int) = text.parse::<i64>() {
                    *value = Value::from(int);
                } else if let Ok(float) = text.parse::<f64>() {
                    if float.is_finite() {
                        *value = Value::from(float);
                    }
                }
            }
            Value::Object(nested) if recurse => coerce_numeric(nested, true),
            _ => {}
        }
    }
}

/// One newline-delimited output line. Callback features always carry the
/// nested tags/meta layout, so coercion recurses regardless of `-e`.
fn ndjson_feature(feature: &Feature, numeric: bool) -> Result<String> {
    let mut feature = feature.clone();
    if numeric {
        coerce_numeric(&mut feature.properties, true);
    }
    Ok(serde_json::to_string(&feature)?)
}

fn run(options: Options) -> Result<()> {
    let data = match options.input.as_deref() {
        Some(path) if path != "-" => {
            fs::read_to_string(path).context(format!("Failed to read {}", path))?
        }
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read standard input")?;
            buffer
        }
    };
    let format = options
        .format
        .unwrap_or_else(|| sniff_format(options.input.as_deref()));

    let converter = OsmToGeoJson::new()
        .verbose(options.verbose)
        .flat_properties(!options.enhanced);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if options.ndjson {
        // Features are streamed from the conversion callback as they are
        // assembled, so they keep the nested property layout and skip
        // winding normalization, unlike the final document.
        let mut failure: Option<anyhow::Error> = None;
        let mut emit = |feature: &Feature| {
            if failure.is_some() {
                return;
            }
            let result = ndjson_feature(feature, options.numeric).and_then(|line| {
                out.write_all(line.as_bytes())?;
                out.write_all(b"\n")?;
                Ok(())
            });
            if let Err(error) = result {
                failure = Some(error);
            }
        };
        match format {
            Format::Json => {
                converter.convert_overpass_json(&data, Some(&mut emit))?;
            }
            Format::Xml => {
                converter.convert_osm_xml(&data, Some(&mut emit))?;
            }
        }
        return match failure {
            Some(error) => Err(error),
            None => Ok(()),
        };
    }

    let mut collection = match format {
        Format::Json => converter.convert_overpass_json(&data, None)?,
        Format::Xml => converter.convert_osm_xml(&data, None)?,
    };

    if options.numeric {
        for feature in &mut collection.features {
            coerce_numeric(&mut feature.properties, options.enhanced);
        }
    }

    if options.minify {
        serde_json::to_writer(&mut out, &collection)?;
        out.write_all(b"\n")?;
    } else {
        serde_json::to_writer_pretty(&mut out, &collection)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

#[test]
fn ndjson_lines_keep_nested_properties_and_coerce_numbers() {
    let converter = OsmToGeoJson::new().flat_properties(true);
    let mut lines: Vec<String> = Vec::new();
    converter
        .convert_overpass_json(
            r#"[{"type": "node", "id": 1, "lat": 1.0, "lon": 2.0,
                 "tags": {"ele": "120", "name": "spot"}}]"#,
            Some(&mut |feature: &Feature| {
                lines.push(ndjson_feature(feature, true).unwrap());
            }),
        )
        .unwrap();
    assert_eq!(lines.len(), 1);
    let parsed: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(parsed["id"], Value::from("node/1"));
    assert_eq!(parsed["properties"]["tags"]["ele"], Value::from(120));
    assert_eq!(parsed["properties"]["tags"]["name"], Value::from("spot"));
}

fn main() {
    Builder::with_level("warn")
        .with_target_writer("*", new_writer(io::stderr()))
        .init();

    let args: Vec<_> = env::args().collect();
    let result = parse_args(&args).and_then(run);
    if let Err(err) = result {
        for cause in err.chain() {
            eprintln!("{}", cause);
        }
        std::process::exit(1);
    }
}
