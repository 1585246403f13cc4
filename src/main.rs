use anyhow::Context;
use clap::{Parser, Subcommand};

use visumod::config::PipelineConfig;
use visumod::diagnostics;
use visumod::graph::RawRecord;
use visumod::pipeline;

#[derive(Parser)]
#[command(name = "visumod")]
#[command(about = "Module-tree views of traced computation graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the module tree and export one module's metadata view.
    Export {
        /// Traced graph: JSON array of {name, op, input, attributes} records.
        #[arg(long)]
        graph: String,

        /// Optional JSON array of fully-qualified parameter names.
        #[arg(long)]
        params: Option<String>,

        /// Absolute module path to export ("" is the root, others end in '/').
        #[arg(short, long, default_value = "")]
        module: String,

        #[arg(short = 'o', long)]
        out: String,
    },

    /// Build the module tree and list every registered module path.
    Modules {
        #[arg(long)]
        graph: String,

        #[arg(long)]
        params: Option<String>,
    },
}

fn main() -> visumod::Result<()> {
    let cli = Cli::parse();
    let cfg = PipelineConfig::default();

    match cli.cmd {
        Commands::Export { graph, params, module, out } => {
            let records = read_records(&graph)?;
            let params = params.as_deref().map(read_params).transpose()?;

            let modu = pipeline::build(records, params.as_deref(), &cfg)?;
            let export = modu.export(&module)?;

            let json = serde_json::to_string_pretty(&export)?;
            std::fs::write(&out, json)
                .with_context(|| diagnostics::error_message(format!("write export {}", out)))?;
            println!("Wrote {}", out);
        }

        Commands::Modules { graph, params } => {
            let records = read_records(&graph)?;
            let params = params.as_deref().map(read_params).transpose()?;

            let modu = pipeline::build(records, params.as_deref(), &cfg)?;
            for path in modu.module_paths() {
                if path.is_empty() {
                    println!("(root)");
                } else {
                    println!("{}", path);
                }
            }
        }
    }

    Ok(())
}

fn read_records(path: &str) -> visumod::Result<Vec<RawRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| diagnostics::error_message(format!("read graph file {}", path)))?;
    let records = serde_json::from_str(&text)
        .with_context(|| diagnostics::error_message(format!("parse graph file {}", path)))?;
    Ok(records)
}

fn read_params(path: &str) -> visumod::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| diagnostics::error_message(format!("read params file {}", path)))?;
    let params = serde_json::from_str(&text)
        .with_context(|| diagnostics::error_message(format!("parse params file {}", path)))?;
    Ok(params)
}
