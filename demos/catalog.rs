use std::env;
use std::fs::{self, File};

use samplekit::Result;
use samplekit::catalog::ResolverConfig;
use samplekit::resolver::MapResolver;

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let mut args = env::args().skip(1);
    let binary = args.next();
    let config = match args.next() {
        Some(path) => ResolverConfig::from_json_reader(File::open(path)?)?,
        None => ResolverConfig::default(),
    };

    let resolver = match binary {
        Some(path) => MapResolver::with_binary_path(config, path),
        None => MapResolver::new(config),
    };
    if !resolver.is_available() {
        eprintln!("no sample maps found");
        return Ok(());
    }

    for entry in resolver.list() {
        let size = match (entry.width, entry.height) {
            (Some(w), Some(h)) => format!("{w}x{h}"),
            _ => "-".to_owned(),
        };
        println!("{:>3}  {:<24} {:<10} {size}", entry.id, entry.name, entry.category);
    }

    if let Ok(dir) = env::var("SAMPLEKIT_PREVIEW_DIR") {
        for slot in resolver.config().catalog.iter() {
            if let Some(png) = resolver.preview(slot.number) {
                fs::write(format!("{dir}/{:03}.png", slot.number), png)?;
            }
        }
    }

    Ok(())
}
