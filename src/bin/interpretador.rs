//! `interpretador`: carrega um arquivo de bytecode `.pbc` gravado pelo
//! `compilador` e o executa na VM.

use std::env;
use std::fs;
use std::process;

use linguagem_pr::{Chunk, Erro, VM};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Uso: {} <arquivo.pbc>", args[0]);
        process::exit(1);
    }

    if let Err(erro) = rodar(&args[1]) {
        eprintln!("{}", erro);
        process::exit(1);
    }
}

fn rodar(arquivo: &str) -> Result<(), Erro> {
    let bytes = fs::read(arquivo)?;
    let chunk = Chunk::from_bytes(&bytes)?;
    VM::novo().interpretar(&chunk)?;
    Ok(())
}
