use std::env;
use std::path;
use std::process;

use tessera::config;
use tessera::model::document;
use tessera::model::utf8;
use tessera::util;

fn setup_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn usage() -> ! {
    eprintln!("usage: dump [--config FILE] PATH");
    process::exit(2);
}

fn main() {
    setup_tracing();

    let mut config_path: Option<path::PathBuf> = None;
    let mut document_path: Option<path::PathBuf> = None;

    let mut args = env::args_os().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config_path = Some(args.next().unwrap_or_else(|| usage()).into());
        } else if document_path.is_none() {
            document_path = Some(arg.into());
        } else {
            usage();
        }
    }

    let Some(document_path) = document_path else { usage() };

    if let Err(e) = config::load(config_path.as_deref()) {
        eprintln!("{}", e);
        process::exit(1);
    }

    let table = match document::open(&document_path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    /* decode errors are reported relative to their piece, so walk the pieces
     * ourselves; sequences never span pieces, so this sees what a cursor sees */
    let mut count: usize = 0;
    for (index, piece) in table.pieces().iter().enumerate() {
        for cp in utf8::iter::CodePoints::new(piece.bytes()) {
            match cp {
                Ok(_) => count += 1,
                Err(e) => {
                    let bytes = piece.bytes();
                    let start = e.offset().min(bytes.len());
                    let context = &bytes[start..bytes.len().min(start + 8)];

                    eprintln!("{}: piece {}: {} after {} code points [{}]", document_path.display(), index, e, count, util::fmt_hex(context));
                    process::exit(1);
                }
            }
        }
    }

    println!("{}: {} code points in {} bytes", document_path.display(), count, table.byte_len());
}
