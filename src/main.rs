use std::io::{self, BufRead, Write};
use std::process;

use clap::Parser;
use env_logger::Env;
use log::{debug, error};

use imapsh::client::ImapConnector;
use imapsh::config::{Args, Config};
use imapsh::session::Credentials;
use imapsh::{Flow, Shell};

/// Asks on the terminal: the username is echoed, the password is not.
struct Terminal;

impl Credentials for Terminal {
    fn username(&mut self) -> io::Result<String> {
        print!("Username: ");
        io::stdout().flush()?;
        let mut user = String::new();
        if io::stdin().read_line(&mut user)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no username given",
            ));
        }
        Ok(user.trim().to_string())
    }

    fn password(&mut self) -> io::Result<String> {
        rpassword::prompt_password("Password: ")
    }
}

fn main() {
    env_logger::Builder::from_env(Env::new().filter_or("IMAPSH_LOG", "warn")).init();

    let args = Args::parse();
    let config = Config::from(&args);
    if let Err(e) = config.validate() {
        error!("{}", e);
        eprintln!("imapsh: {}", e);
        process::exit(1);
    }
    debug!("starting with {:?}", config);

    let connector = ImapConnector {
        debug: config.debug,
    };
    let mut shell = Shell::new(connector, config);
    if let Err(e) = run(&mut shell, args.server.as_deref()) {
        eprintln!("imapsh: {}", e);
        shell.close();
        process::exit(1);
    }
    shell.close();
}

fn run(shell: &mut Shell<ImapConnector>, server: Option<&str>) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if let Some(server) = server {
        let line = format!("connect {}", server);
        shell.run_line(&line, &mut Terminal, &mut stdout)?;
    }

    let mut line = String::new();
    loop {
        write!(stdout, "{}> ", shell.prompt())?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            break;
        }
        if shell.run_line(&line, &mut Terminal, &mut stdout)? == Flow::Quit {
            break;
        }
    }
    writeln!(stdout, "Good bye!")?;
    Ok(())
}
