use std::fmt::Write;

use super::chunk::Chunk;
use super::opcode::OpCode;

/// Desmonta o chunk inteiro em forma textual, com um cabeçalho nomeado.
/// Puro: não escreve no console, só devolve o texto.
pub fn desmontar_chunk(chunk: &Chunk, nome: &str) -> String {
    let mut saida = String::new();
    let _ = writeln!(saida, "== {} ==", nome);
    let mut offset = 0;
    while offset < chunk.code.len() {
        offset = desmontar_instrucao(chunk, offset, &mut saida);
    }
    saida
}

/// Desmonta uma instrução no offset dado e devolve o offset da próxima.
/// A coluna de linha repete "   |" enquanto a linha de origem não muda.
pub fn desmontar_instrucao(chunk: &Chunk, offset: usize, saida: &mut String) -> usize {
    let _ = write!(saida, "{:04} ", offset);
    let linha = chunk.lines.get(offset).copied().unwrap_or(0);
    if offset > 0 && chunk.lines.get(offset - 1) == Some(&linha) {
        saida.push_str("   | ");
    } else {
        let _ = write!(saida, "{:4} ", linha);
    }

    let byte = chunk.code[offset];
    match OpCode::try_from(byte) {
        Ok(op) => match op {
            OpCode::Constant
            | OpCode::DefineGlobal
            | OpCode::GetGlobal
            | OpCode::SetGlobal => instrucao_constante(op, chunk, offset, saida),
            OpCode::Jump | OpCode::JumpIfFalse => instrucao_salto(op, 1, chunk, offset, saida),
            OpCode::Loop => instrucao_salto(op, -1, chunk, offset, saida),
            _ => instrucao_simples(op, offset, saida),
        },
        Err(byte) => {
            let _ = writeln!(saida, "Byte desconhecido {}", byte);
            offset + 1
        }
    }
}

fn instrucao_simples(op: OpCode, offset: usize, saida: &mut String) -> usize {
    let _ = writeln!(saida, "{}", op);
    offset + 1
}

fn instrucao_constante(op: OpCode, chunk: &Chunk, offset: usize, saida: &mut String) -> usize {
    let Some(indice) = chunk.code.get(offset + 1).copied() else {
        let _ = writeln!(saida, "{:<16} <operando ausente>", op);
        return offset + 1;
    };
    match chunk.constants.get(indice as usize) {
        Some(constante) => {
            let _ = writeln!(saida, "{:<16} {:4} '{}'", op, indice, constante);
        }
        None => {
            let _ = writeln!(saida, "{:<16} {:4} <constante inválida>", op, indice);
        }
    }
    offset + 2
}

fn instrucao_salto(
    op: OpCode,
    sinal: isize,
    chunk: &Chunk,
    offset: usize,
    saida: &mut String,
) -> usize {
    let (Some(alto), Some(baixo)) = (
        chunk.code.get(offset + 1).copied(),
        chunk.code.get(offset + 2).copied(),
    ) else {
        let _ = writeln!(saida, "{:<16} <operando ausente>", op);
        return chunk.code.len();
    };
    let distancia = ((alto as usize) << 8) | baixo as usize;
    let alvo = offset as isize + 3 + sinal * distancia as isize;
    // A coluna numérica é o offset da própria instrução; a distância só
    // aparece resolvida no alvo.
    let _ = writeln!(saida, "{:<16} {:4} -> {}", op, offset, alvo);
    offset + 3
}
