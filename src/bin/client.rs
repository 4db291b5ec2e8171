//! Interactive wicket client.
//!
//! A small test client for driving a wicket server by hand. Reads commands
//! from stdin, sends one request per command and prints the reply status.

use std::process::ExitCode;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::net::TcpStream;

use wicket::protocol::{decode_reply, encode_request, Request};

const DEFAULT_ADDR: &str = "127.0.0.1:2000";

#[tokio::main]
async fn main() -> ExitCode {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Failed to connect to {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    println!("Connected to {addr}");

    if let Err(e) = run(stream).await {
        eprintln!("Connection error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(stream: TcpStream) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut server = BufReader::new(read_half);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    print_commands();

    loop {
        println!("Command:");
        let Some(command) = stdin.next_line().await? else {
            break;
        };
        let command = command.trim().to_lowercase();

        let request = match command.as_str() {
            "login" | "create" | "reset" => {
                let username = prompt(&mut stdin, "Username:").await?;
                let password = prompt(&mut stdin, "Password:").await?;
                match command.as_str() {
                    "login" => Request::Login { username, password },
                    "create" => Request::Create { username, password },
                    _ => Request::Reset { username, password },
                }
            }
            "search" | "delete" => {
                let username = prompt(&mut stdin, "Username:").await?;
                if command == "search" {
                    Request::Search { username }
                } else {
                    Request::Delete { username }
                }
            }
            "logout" => Request::Logout,
            "quit" | "exit" => break,
            _ => {
                print_commands();
                continue;
            }
        };

        let logging_out = matches!(request, Request::Logout);

        let line = match encode_request(&request) {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Failed to encode request: {e}");
                continue;
            }
        };
        write_half.write_all(line.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
        write_half.flush().await?;

        if logging_out {
            // The server closes the connection instead of replying.
            println!("Logged out.");
            break;
        }

        let mut reply_line = String::new();
        if server.read_line(&mut reply_line).await? == 0 {
            println!("Server closed the connection.");
            break;
        }
        match decode_reply(&reply_line) {
            Ok(reply) => println!("{}", reply.status),
            Err(e) => eprintln!("Bad reply from server: {e}"),
        }
    }

    Ok(())
}

async fn prompt(stdin: &mut Lines<BufReader<Stdin>>, label: &str) -> std::io::Result<String> {
    println!("{label}");
    let line = stdin.next_line().await?.unwrap_or_default();
    Ok(line.trim().to_string())
}

fn print_commands() {
    println!(
        "The commands are:\n\
         \n\
         While not logged in:\n\
            login  - log in\n\
            create - create an account\n\
            reset  - reset a password\n\
         \n\
         While logged in:\n\
            search - search for a user\n\
            delete - delete a user (admin only)\n\
            logout - log out and disconnect\n\
         \n\
         quit   - exit the client"
    );
}
