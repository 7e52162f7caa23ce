//! `compilador`: compila um fonte `.pr` para um arquivo de bytecode `.pbc`.
//!
//! Com `--debug` imprime a listagem desmontada do chunk; com `--executar`
//! roda o programa direto na VM em vez de gravar o arquivo.

use std::env;
use std::fs;
use std::path::Path;
use std::process;

use linguagem_pr::bytecode::debug;
use linguagem_pr::{compilar_fonte, Erro, VM};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Uso: {} <arquivo.pr> [--debug] [--executar]", args[0]);
        process::exit(1);
    }
    let arquivo = &args[1];
    let listar = args.iter().any(|a| a == "--debug");
    let executar = args.iter().any(|a| a == "--executar");

    if let Err(erro) = rodar(arquivo, listar, executar) {
        eprintln!("{}", erro);
        process::exit(1);
    }
}

fn rodar(arquivo: &str, listar: bool, executar: bool) -> Result<(), Erro> {
    let codigo = fs::read_to_string(arquivo)?;
    let chunk = compilar_fonte(&codigo)?;

    if listar {
        print!("{}", debug::desmontar_chunk(&chunk, arquivo));
    }
    if executar {
        VM::novo().interpretar(&chunk)?;
        return Ok(());
    }

    let destino = Path::new(arquivo).with_extension("pbc");
    fs::write(&destino, chunk.to_bytes()?)?;
    println!("Bytecode gravado em {}", destino.display());
    Ok(())
}
