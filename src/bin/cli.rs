#![cfg(feature = "cli")]

use ansi_term::Colour;
use rotonda_fib::fib::Fib;
use rotonda_fib::{Dxr, NextHop, Sail};

use std::env;
use std::error::Error;
use std::ffi::OsString;
use std::fs::File;
use std::net::Ipv4Addr;
use std::process;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const HISTORY_FILE: &str = "/tmp/rotonda-fib-history.txt";

fn get_first_arg() -> Result<OsString, Box<dyn Error>> {
    match env::args_os().nth(1) {
        None => Err(From::from("expected 1 argument, but got none")),
        Some(file_path) => Ok(file_path),
    }
}

// Lines in the file look like `10.0.0.0,8,1`: address, prefix length and
// next hop, after a header line.
fn load_routes(
    routes: &mut Vec<(Ipv4Addr, u8, NextHop)>,
) -> Result<(), Box<dyn Error>> {
    let file_path = get_first_arg()?;
    let file = File::open(file_path)?;
    let mut rdr = csv::Reader::from_reader(file);
    for result in rdr.records() {
        let record = result?;
        let (Some(net), Some(len), Some(nh)) =
            (record.get(0), record.get(1), record.get(2))
        else {
            return Err(format!("short record {:?}", record).into());
        };
        routes.push((net.parse()?, len.parse()?, NextHop::new(nh.parse()?)));
    }
    Ok(())
}

// Parse `a.b.c.d/len nexthop`.
fn parse_route(args: &str) -> Result<(Ipv4Addr, u8, NextHop), Box<dyn Error>> {
    let mut parts = args.split_whitespace();
    let (Some(prefix), Some(nh)) = (parts.next(), parts.next()) else {
        return Err("expected <address>/<len> <next hop>".into());
    };
    let Some((net, len)) = prefix.split_once('/') else {
        return Err(format!("can't parse prefix {:?}", prefix).into());
    };
    Ok((net.parse()?, len.parse()?, NextHop::new(nh.parse()?)))
}

fn print_stats(dxr: &Fib<Dxr>, sail: &Fib<Sail>) {
    println!("{}\n{}\n", Colour::Blue.paint("dxr"), dxr.stats());
    println!("{}\n{}", Colour::Blue.paint("sail"), sail.stats());
}

fn commit(dxr: &mut Fib<Dxr>, sail: &mut Fib<Sail>) {
    let start = std::time::Instant::now();
    match dxr.commit() {
        Ok(stats) => println!(
            "dxr committed in {} msecs: {}",
            start.elapsed().as_millis(),
            stats
        ),
        Err(err) => println!("{}", Colour::Red.paint(format!("dxr: {}", err))),
    }
    let start = std::time::Instant::now();
    match sail.commit() {
        Ok(stats) => println!(
            "sail committed in {} msecs: {}",
            start.elapsed().as_millis(),
            stats
        ),
        Err(err) => {
            println!("{}", Colour::Red.paint(format!("sail: {}", err)))
        }
    }
}

fn lookup(dxr: &Fib<Dxr>, sail: &Fib<Sail>, addr: Ipv4Addr) {
    let addr = u32::from(addr);
    let dxr_nh = dxr.lookup(addr);
    let sail_nh = sail.lookup(addr);
    let levels = sail
        .with_table(|table| table.lookup_depth(addr).1)
        .unwrap_or(0);

    println!("dxr :\t{}", dxr_nh);
    println!("sail :\t{} ({} levels)", sail_nh, levels);
    if dxr_nh != sail_nh {
        println!(
            "{}",
            Colour::Red.paint("Error: backends disagree on the next hop")
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut routes = vec![];
    let mut dxr = Fib::<Dxr>::try_default()?;
    let mut sail = Fib::<Sail>::try_default()?;

    if let Err(err) = load_routes(&mut routes) {
        println!("error loading routes: {}", err);
        process::exit(1);
    }
    println!("finished loading {} routes...", routes.len());

    let mut duplicates = 0;
    for (net, len, nh) in routes {
        if dxr.route_add(u32::from(net), len, nh).is_err() {
            duplicates += 1;
            continue;
        }
        sail.route_add(u32::from(net), len, nh)?;
    }
    if duplicates > 0 {
        println!(
            "{}",
            Colour::Yellow
                .paint(format!("Warning: skipped {} routes", duplicates))
        );
    }
    commit(&mut dxr, &mut sail);
    print_stats(&dxr, &sail);

    let mut rl = DefaultEditor::new()?;
    if rl.load_history(HISTORY_FILE).is_err() {
        println!("No previous history.");
    }
    loop {
        let readline = rl.readline("(rotonda-fib)> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Ok(addr) = line.parse::<Ipv4Addr>() {
                    lookup(&dxr, &sail, addr);
                    continue;
                }

                let (cmd, args) = line.split_once(' ').unwrap_or((line, ""));
                match cmd {
                    "a" => match parse_route(args) {
                        Ok((net, len, nh)) => {
                            let res = dxr
                                .route_add(u32::from(net), len, nh)
                                .and_then(|_| {
                                    sail.route_add(u32::from(net), len, nh)
                                });
                            match res {
                                Ok(()) => println!(
                                    "added {}/{} -> {}, not committed yet",
                                    net, len, nh
                                ),
                                Err(err) => println!("Error: {}", err),
                            }
                        }
                        Err(err) => println!("Error: {}", err),
                    },
                    "c" => commit(&mut dxr, &mut sail),
                    "s" => print_stats(&dxr, &sail),
                    "q" => break,
                    _ => {
                        println!(
                            "Error: unknown command {:?}. Type an address \
                            to look it up, or one of `a <prefix>/<len> \
                            <next hop>`, `c`, `s`, `q`.",
                            cmd
                        );
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(_err) => {
                println!("Error: Can't parse the command");
                continue;
            }
        }
    }
    rl.save_history(HISTORY_FILE)?;
    Ok(())
}
