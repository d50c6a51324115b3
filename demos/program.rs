use boi::Program;

fn main() -> anyhow::Result<()> {
    let source = "
        let peek () = secret;
        let reveal secret = peek ();
        let sum_to n = if n == 0 then 0 else n + sum_to (n - 1);
        reveal 42;
        peek ();
        sum_to 10;
        let add a b = a + b in add 4 1
    ";

    let mut program = Program::parse(source)?;
    let mut index = 0;
    while let Some(result) = program.step() {
        match result {
            Ok(Some(value)) => println!("{}: {}", index, value),
            Ok(None) => println!("{}: function", index),
            Err(err) => println!("{}: {}", index, err.report()),
        }
        index += 1;
    }

    Ok(())
}
