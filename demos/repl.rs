use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};
use boi::{parse, Program};

async fn query(stdout: &mut io::Stdout, lines: &mut io::Lines<io::BufReader<io::Stdin>>) -> io::Result<Option<String>> {
    stdout.write_all("> ".as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}

#[tokio::main]
async fn main() {
    let mut program = Program::new(Vec::new());
    let mut lines = io::BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Ok(Some(line)) = query(&mut stdout, &mut lines).await {
        let declarations = match parse(&line) {
            Ok(declarations) => declarations,
            Err(err) => {
                println!("{}", err.report());
                continue;
            }
        };

        // Stop at the first failing declaration so the rest of the line
        // doesn't leak into the next one
        for declaration in declarations {
            program.extend([declaration]);
            match program.step() {
                Some(Ok(Some(value))) => println!("{}", value),
                Some(Ok(None)) | None => {}
                Some(Err(err)) if err.is_fatal() => {
                    println!("Fatal: {}", err.report());
                    return;
                }
                Some(Err(err)) => {
                    println!("{}", err.report());
                    break;
                }
            }
        }
    }
}
