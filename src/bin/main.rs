use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use fesi::adaptor::EventAdaptorSynthesizer;
use fesi::codegen::inspect;
use fesi::config::{Config, MethodOrder};

#[derive(Parser)]
#[command(name = "fesi")]
#[command(about = "JVM event adaptor synthesis for the FESI runtime")]
#[command(version)]
struct Cli {
    /// Log synthesis phases
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize an adaptor class for a listener interface
    Adaptor {
        /// Fully qualified listener interface
        #[arg(value_name = "LISTENER")]
        listener: String,

        /// Output directory for .class files
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Directory scanned for listener declarations (repeatable)
        #[arg(long, value_name = "DIR")]
        classpath: Vec<PathBuf>,

        /// Stub order: sorted or declaration
        #[arg(long, value_name = "ORDER")]
        order: Option<MethodOrder>,

        /// Emit SourceFile, LineNumberTable and LocalVariableTable attributes
        #[arg(short = 'g', long)]
        debug_info: bool,

        /// Fail when any listener method gets no stub
        #[arg(long)]
        strict: bool,
    },

    /// Print the structure of a class file
    Inspect {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Also list the constant pool
        #[arg(short, long)]
        constants: bool,
    },

    /// List a listener's methods in stub order
    Methods {
        #[arg(value_name = "LISTENER")]
        listener: String,

        #[arg(long, value_name = "DIR")]
        classpath: Vec<PathBuf>,

        #[arg(long, value_name = "ORDER")]
        order: Option<MethodOrder>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Adaptor { listener, output, classpath, order, debug_info, strict } => {
            let mut config = base_config(classpath, order);
            config.emit_source_file = debug_info;
            config.emit_debug_tables = debug_info;
            config.fail_on_warning = strict;
            synthesize(&listener, output, &config)?;
        }
        Commands::Inspect { input, constants } => {
            inspect_file(&input, constants)?;
        }
        Commands::Methods { listener, classpath, order } => {
            list_methods(&listener, &base_config(classpath, order))?;
        }
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let _ = env_logger::builder()
        .filter_level(level)
        .parse_env("FESI_LOG")
        .format_timestamp(None)
        .try_init();
}

fn base_config(classpath: Vec<PathBuf>, order: Option<MethodOrder>) -> Config {
    let mut config = Config::from_env();
    config.classpath.extend(classpath);
    if let Some(order) = order {
        config.method_order = order;
    }
    config
}

fn synthesize(listener: &str, output: Option<PathBuf>, config: &Config) -> Result<()> {
    let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
    let (adaptor, path) = fesi::synthesize_adaptor_to_dir(listener, &output_dir, config)
        .with_context(|| format!("synthesizing adaptor for {}", listener))?;

    for warning in &adaptor.warnings {
        eprintln!("warning: {}", warning);
    }
    println!("{} -> {} ({} stubs)", adaptor.class_name, path.display(), adaptor.methods.len());
    Ok(())
}

fn inspect_file(input: &PathBuf, constants: bool) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let summary = inspect(&bytes).with_context(|| format!("inspecting {}", input.display()))?;

    println!("class {} (version {}.{})", summary.this_class, summary.major_version, summary.minor_version);
    println!("  access flags: 0x{:04x}", summary.access_flags);
    if let Some(super_class) = &summary.super_class {
        println!("  extends {}", super_class);
    }
    for interface in &summary.interfaces {
        println!("  implements {}", interface);
    }
    if constants {
        println!("  constant pool ({} slots):", summary.constant_pool_count);
        for (index, constant) in &summary.constants {
            println!("    #{:<4} {:?}", index, constant);
        }
    }
    for field in &summary.fields {
        println!("  field 0x{:04x} {} {}", field.access_flags, field.name, field.descriptor);
    }
    for method in &summary.methods {
        println!("  method 0x{:04x} {}{}", method.access_flags, method.name, method.descriptor);
        if let Some(code) = &method.code {
            println!(
                "    code: {} bytes, max_stack={}, max_locals={}, handlers={}",
                code.code.len(),
                code.max_stack,
                code.max_locals,
                code.exception_table.len()
            );
        }
        if !method.exceptions.is_empty() {
            println!("    throws {}", method.exceptions.join(", "));
        }
    }
    if !summary.attribute_names.is_empty() {
        println!("  attributes: {}", summary.attribute_names.join(", "));
    }
    Ok(())
}

fn list_methods(listener: &str, config: &Config) -> Result<()> {
    let registry = fesi::load_registry(config)?;
    let synthesizer = EventAdaptorSynthesizer::new(&registry, config);
    let methods = synthesizer.listener_methods(listener)?;
    for (ordinal, method) in methods.iter().enumerate() {
        println!("{:>3} {}", ordinal, method.signature());
    }
    Ok(())
}
