use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use huffpress::{inspect, Codec, CodecConfig, CompressionLevel, FrameInfo};

#[derive(Parser, Debug)]
#[command(name = "huffpress")]
#[command(about = "Block compressor: LZ77 matching with per-block Huffman coding")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress a file into a huffpress frame
    Compress(CompressArgs),
    /// Decompress a huffpress frame
    Decompress(DecompressArgs),
    /// Describe a frame (exit 0 = valid frame, 1 = not a frame, 2 = error)
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct CompressArgs {
    /// Input file (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (use - for stdout)
    #[arg(short, long)]
    output: PathBuf,

    /// Compression level (1-5 fast engine, 6-9 deep engine)
    #[arg(short, long, default_value = "9")]
    level: i32,

    /// Number of threads (0 = auto, 1 = single-threaded)
    #[arg(short = 't', long, default_value = "0")]
    threads: usize,

    /// Uncompressed bytes per chunk (0 = a single chunk)
    #[arg(long, default_value = "1048576")]
    chunk_size: usize,

    /// Fail if the compressed frame would exceed this many bytes
    #[arg(long)]
    max_output: Option<usize>,

    /// Show verbose statistics
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct DecompressArgs {
    /// Input frame (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (use - for stdout)
    #[arg(short, long)]
    output: PathBuf,

    /// Expected decompressed size (default: size recorded in the frame)
    #[arg(long)]
    size: Option<usize>,

    /// Number of threads (0 = auto, 1 = single-threaded)
    #[arg(short = 't', long, default_value = "0")]
    threads: usize,

    /// Show verbose statistics
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Input frame (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,
}

/// Exit codes
const EXIT_OK: u8 = 0;
const EXIT_NOT_FRAME: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Compress(args) => run_compress(&args),
        Command::Decompress(args) => run_decompress(&args),
        Command::Info(args) => run_info(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn read_input(path: &Path) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    if path.to_str() == Some("-") {
        io::stdin().lock().read_to_end(&mut data)?;
    } else {
        File::open(path)?.read_to_end(&mut data)?;
    }
    Ok(data)
}

fn write_output(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut output: Box<dyn Write> = if path.to_str() == Some("-") {
        Box::new(io::stdout().lock())
    } else {
        Box::new(BufWriter::new(File::create(path)?))
    };
    output.write_all(data)?;
    output.flush()
}

fn run_compress(args: &CompressArgs) -> Result<u8, Box<dyn std::error::Error>> {
    let config = CodecConfig {
        compression_level: CompressionLevel::try_from(args.level)?,
        chunk_size: args.chunk_size,
        num_threads: args.threads,
    };
    let codec = Codec::with_config(config)?;

    let data = read_input(&args.input)?;
    let capacity = args.max_output.unwrap_or_else(|| codec.compress_bound(data.len()));

    let start = Instant::now();
    let compressed = codec.compress(&data, capacity)?;
    let elapsed = start.elapsed();

    write_output(&args.output, &compressed)?;

    if args.verbose {
        let engine = codec.engine();
        eprintln!("Compression complete:");
        eprintln!("  Engine:           {} (level {})", engine.engine, engine.level.level());
        eprintln!("  Input bytes:      {}", data.len());
        eprintln!("  Output bytes:     {}", compressed.len());
        eprintln!(
            "  Ratio:            {:.2}%",
            compressed.len() as f64 * 100.0 / data.len().max(1) as f64
        );
        eprintln!("  Time:             {:.2?}", elapsed);
        eprintln!(
            "  Throughput:       {:.1} MB/s",
            data.len() as f64 / elapsed.as_secs_f64() / 1_000_000.0
        );
    }

    Ok(EXIT_OK)
}

fn run_decompress(args: &DecompressArgs) -> Result<u8, Box<dyn std::error::Error>> {
    let data = read_input(&args.input)?;
    let size = match args.size {
        Some(size) => size,
        None => usize::try_from(inspect(&data)?.uncompressed_len)?,
    };

    // The level does not affect decoding
    let config = CodecConfig { num_threads: args.threads, ..Default::default() };
    let codec = Codec::with_config(config)?;

    let start = Instant::now();
    let decompressed = codec.decompress(&data, size)?;
    let elapsed = start.elapsed();

    write_output(&args.output, &decompressed)?;

    if args.verbose {
        eprintln!("Decompression complete:");
        eprintln!("  Input bytes:      {}", data.len());
        eprintln!("  Output bytes:     {}", decompressed.len());
        eprintln!("  Time:             {:.2?}", elapsed);
        eprintln!(
            "  Throughput:       {:.1} MB/s",
            decompressed.len() as f64 / elapsed.as_secs_f64() / 1_000_000.0
        );
    }

    Ok(EXIT_OK)
}

fn run_info(args: &InfoArgs) -> Result<u8, Box<dyn std::error::Error>> {
    let data = read_input(&args.input)?;

    match inspect(&data) {
        Ok(info) => {
            print_info(&info);
            Ok(EXIT_OK)
        }
        Err(e) => {
            eprintln!("Frame: no ({})", e);
            Ok(EXIT_NOT_FRAME)
        }
    }
}

fn print_info(info: &FrameInfo) {
    println!("Frame: yes");
    println!("Version: {}", info.version);
    println!("Chunks: {} ({} stored)", info.chunk_count(), info.stored_blocks());
    println!("Compressed size: {} bytes", info.compressed_len);
    println!("Uncompressed size: {} bytes", info.uncompressed_len);
    for (i, block) in info.blocks.iter().enumerate() {
        println!(
            "  block {}: {:?}, {} engine, {} -> {} bytes",
            i, block.kind, block.engine, block.uncompressed_len, block.compressed_len
        );
    }
}
