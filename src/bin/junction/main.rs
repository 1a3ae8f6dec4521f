//! Junction command-line front end.
//!
//! Edits the saved routes and runs them against the platform's MIDI ports.

mod cli;

use std::io::BufRead;

use clap::Parser;
use cli::{Cli, Command, LiveCommand, LiveLine, RouteCommand};
use junction::{
    port_label, Error, Junction, JunctionConfig, MessageType, Port, PortType, RouteSettings,
    Transpose,
};
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => JunctionConfig::from_file(path)?,
        None => JunctionConfig::default(),
    };
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    match cli.command {
        Command::Transposes => {
            for transpose in Transpose::options() {
                println!("{:>3}  {}", transpose.to_string(), transpose.label());
            }
        }
        Command::Types => {
            for message_type in MessageType::SELECTABLE {
                println!("{:>2}  {}", message_type.code(), message_type.label());
            }
        }
        Command::Ports => {
            let junction = open(config, false)?;
            print_ports("Inputs", &junction.inputs());
            print_ports("Outputs", &junction.outputs());
        }
        Command::Routes => {
            let junction = open(config, false)?;
            print_routes(&junction);
        }
        Command::Route(command) => {
            let junction = open(config, false)?;
            apply_route_command(&junction, command)?;
        }
        Command::Run => {
            let junction = open(config, true)?;
            run(&junction)?;
        }
    }

    Ok(())
}

/// Open a session on the hardware ports. Unless `require_hardware`, a
/// missing MIDI backend degrades to an empty port list so routes can
/// still be edited.
fn open(config: JunctionConfig, require_hardware: bool) -> junction::Result<Junction> {
    match Junction::builder().config(config.clone()).hardware().build() {
        Ok(junction) => Ok(junction),
        Err(Error::Midi(e)) if !require_hardware => {
            warn!("MIDI unavailable, showing saved routes only: {}", e);
            Junction::builder().config(config).build()
        }
        Err(e) => Err(e),
    }
}

fn apply_route_command(junction: &Junction, command: RouteCommand) -> junction::Result<()> {
    match command {
        RouteCommand::Add {
            input,
            output,
            settings,
        } => {
            if !junction.can_add_route() {
                return Err(Error::NoPorts);
            }
            let input = junction.resolve_port(PortType::Input, input.as_deref())?;
            let output = junction.resolve_port(PortType::Output, output.as_deref())?;
            let settings = settings.apply(RouteSettings::default())?;
            let index = junction.add_route(&input.id, &output.id, settings)?;
            println!("Added route {}: {} -> {}", index, input.label(), output.label());
        }
        RouteCommand::Edit { index, settings } => {
            let route = junction
                .routes()
                .get(index)
                .cloned()
                .ok_or(junction::core::Error::RouteNotFound(index))?;
            junction.edit_route(index, settings.apply(route.settings())?)?;
            print_routes(junction);
        }
        RouteCommand::Remove { index } => {
            let route = junction.remove_route(index)?;
            println!("Removed route {}: {} -> {}", index, route.in_id, route.out_id);
        }
    }
    Ok(())
}

fn print_ports(heading: &str, ports: &[Port]) {
    println!("{}:", heading);
    if ports.is_empty() {
        println!("  (none)");
    }
    for port in ports {
        println!("  {}  [{}]", port.label(), port.id);
    }
}

fn print_routes(junction: &Junction) {
    let views = junction.route_views();
    if views.is_empty() {
        println!("No routes.");
        return;
    }
    for view in views {
        println!(
            "{}: {}{} -> {}{}",
            view.index,
            view.source,
            if view.source_inactive { " (inactive)" } else { "" },
            view.destination,
            if view.destination_inactive { " (inactive)" } else { "" },
        );
        for line in view.summary.lines() {
            println!("   {}", line);
        }
    }
}

fn run(junction: &Junction) -> junction::Result<()> {
    print_routes(junction);
    info!(
        "Routing between {} inputs and {} outputs",
        junction.inputs().len(),
        junction.outputs().len()
    );
    println!("Routing. Enter add, edit, remove, routes, ports or activity; quit to stop.");

    // Routing happens on the MIDI threads; edits here take effect on the next message
    for line in std::io::stdin().lock().lines() {
        let command = match LiveLine::parse_line(&line?) {
            Ok(Some(parsed)) => parsed.command,
            Ok(None) => continue,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };
        match command {
            LiveCommand::Quit => break,
            LiveCommand::Routes => print_routes(junction),
            LiveCommand::Ports => {
                print_ports("Inputs", &junction.inputs());
                print_ports("Outputs", &junction.outputs());
            }
            LiveCommand::Activity => print_activity(junction),
            LiveCommand::Route(command) => {
                if let Err(e) = apply_route_command(junction, command) {
                    eprintln!("error: {}", e);
                }
            }
        }
    }

    print_activity(junction);
    Ok(())
}

fn print_activity(junction: &Junction) {
    let inputs = junction.inputs();
    let outputs = junction.outputs();
    println!("Activity:");
    for entry in junction.activity() {
        let (direction, port) = match entry.port_type {
            PortType::Input => ("in ", inputs.iter().find(|p| p.id == entry.port_id)),
            PortType::Output => ("out", outputs.iter().find(|p| p.id == entry.port_id)),
        };
        println!(
            "  {} {}: {} messages",
            direction,
            port_label(&entry.port_id, port),
            entry.messages
        );
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("junction=debug,junction_core=debug,junction_midi_io=debug,warn")
        } else {
            EnvFilter::new("junction=info,junction_core=info,junction_midi_io=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
