//! Linguagem de script com palavras-chave em português, compilada para
//! bytecode e executada em uma máquina virtual de pilha.
//!
//! A pipeline tem quatro estágios: o léxico ([`lexer`]) produz tokens, o
//! sintático ([`parser`]) monta a árvore de comandos, o compilador
//! ([`bytecode::Compilador`]) emite um [`Chunk`] e a [`VM`] o executa. O
//! chunk também pode ser gravado em um arquivo `.pbc` e executado depois
//! pelo binário `interpretador`, sem recompilar o fonte.

pub mod ast;
pub mod bytecode;
pub mod erros;
pub mod lexer;
pub mod parser;
pub mod valor;

pub use bytecode::{Chunk, Compilador, VM};
pub use erros::Erro;
pub use valor::Valor;

/// Compila o código fonte até o chunk, atravessando os três primeiros
/// estágios da pipeline. Qualquer estágio pode abortar com o erro próprio.
pub fn compilar_fonte(codigo: &str) -> Result<Chunk, Erro> {
    let tokens = lexer::escanear(codigo)?;
    let comandos = parser::Analisador::new(tokens).analisar()?;
    let chunk = Compilador::new().compile(&comandos)?;
    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn executar(codigo: &str, entrada: &str) -> String {
        let chunk = compilar_fonte(codigo).expect("código deveria compilar");
        let mut saida = Vec::new();
        VM::com_io(Cursor::new(entrada.to_string()), &mut saida)
            .interpretar(&chunk)
            .expect("código deveria executar");
        String::from_utf8(saida).expect("saída deveria ser UTF-8")
    }

    #[test]
    fn pipeline_completa_do_fonte_a_saida() {
        assert_eq!(executar("VAR x = 10;\nESCREVEAI x + 5;", ""), "15\n");
    }

    #[test]
    fn condicional_escolhe_o_ramo_certo() {
        let codigo = "VAR x = 1;\n\
                      SE (x > 2) { ESCREVEAI \"a\"; } SENAO { ESCREVEAI \"b\"; }";
        assert_eq!(executar(codigo, ""), "b\n");
    }

    #[test]
    fn laco_do_fonte_conta_ate_tres() {
        let codigo = "VAR i = 0;\n\
                      VOLTAINFINITA (i < 3) {\n\
                        ESCREVEAI i;\n\
                        i = i + 1;\n\
                      }";
        assert_eq!(executar(codigo, ""), "0\n1\n2\n");
    }

    #[test]
    fn fazavolta_com_incremento() {
        let codigo = "FAZAVOLTA (VAR i = 0; i < 6; i = i + 2) { ESCREVEAI i; }";
        assert_eq!(executar(codigo, ""), "0\n2\n4\n");
    }

    #[test]
    fn leitura_e_soma_do_console() {
        assert_eq!(
            executar("VAR n;\nLEIA n;\nESCREVEAI n + 1;", "41\n"),
            "> 42\n"
        );
    }

    #[test]
    fn chunk_gravado_e_relido_executa_igual() {
        let chunk = compilar_fonte("ESCREVEAI 1 + 2;").expect("código deveria compilar");
        let bytes = chunk.to_bytes().expect("codificação deveria funcionar");
        let relido = Chunk::from_bytes(&bytes).expect("decodificação deveria funcionar");

        let mut saida = Vec::new();
        VM::com_io(Cursor::new(String::new()), &mut saida)
            .interpretar(&relido)
            .expect("chunk relido deveria executar");
        assert_eq!(saida, b"3\n");
    }

    #[test]
    fn erro_lexico_interrompe_a_pipeline() {
        assert!(matches!(compilar_fonte("VAR a = @;"), Err(Erro::Lexico(_))));
    }

    #[test]
    fn erro_sintatico_interrompe_a_pipeline() {
        assert!(matches!(
            compilar_fonte("VAR a = ;"),
            Err(Erro::Sintaxe(_))
        ));
    }

    #[test]
    fn operador_sem_backend_interrompe_a_pipeline() {
        assert!(matches!(
            compilar_fonte("ESCREVEAI 5 % 2;"),
            Err(Erro::Compilacao(_))
        ));
    }
}
