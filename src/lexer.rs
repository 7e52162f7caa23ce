use logos::Logos;

use crate::erros::ErroLexico;

/// Tokens da linguagem. As palavras-chave são as originais, em maiúsculas
/// (`ESCREVEAI` imprime, `VOLTAINFINITA` é o laço, `LEIA` lê do console...).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum TipoToken {
    // Palavras-chave
    #[token("VAR")]
    Var,
    #[token("FUNCAO")]
    Funcao,
    #[token("RETORNA")]
    Retorna,
    #[token("ESCREVEAI")]
    Escreveai,
    #[token("FAZAVOLTA")]
    Fazavolta,
    #[token("VOLTAINFINITA")]
    Voltainfinita,
    #[token("SE")]
    Se,
    #[token("SENAO")]
    Senao,
    #[token("ISSOAI")]
    Issoai,
    #[token("MENTIRA")]
    Mentira,
    #[token("NULO")]
    Nulo,
    #[token("ESCOLHEAI")]
    Escolheai,
    #[token("CASO")]
    Caso,
    #[token("PADRAO")]
    Padrao,
    #[token("LEIA")]
    Leia,
    #[token("PAREI")]
    Parei,

    // Pontuação
    #[token("(")]
    ParenEsq,
    #[token(")")]
    ParenDir,
    #[token("{")]
    ChaveEsq,
    #[token("}")]
    ChaveDir,
    #[token(",")]
    Virgula,
    #[token(";")]
    PontoVirgula,
    #[token(":")]
    DoisPontos,

    // Operadores
    #[token("++")]
    MaisMais,
    #[token("--")]
    MenosMenos,
    #[token("+")]
    Mais,
    #[token("-")]
    Menos,
    #[token("*")]
    Estrela,
    #[token("/")]
    Barra,
    #[token("%")]
    Porcento,
    #[token("!=")]
    DiferenteDe,
    #[token("!")]
    Exclamacao,
    #[token("==")]
    IgualIgual,
    #[token("=")]
    Igual,
    #[token("<=")]
    MenorIgual,
    #[token("<")]
    Menor,
    #[token(">=")]
    MaiorIgual,
    #[token(">")]
    Maior,
    #[token("&&")]
    ELogico,
    #[token("||")]
    OuLogico,

    // Literais
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Flutuante(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Inteiro(i64),

    #[regex(r#""[^"]*""#, |lex| lex.slice().trim_matches('"').to_string())]
    Texto(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identificador(String),
}

/// Token com a linha de origem anexada, consumido pelo analisador sintático
/// e propagado até o mapa de linhas do chunk.
#[derive(Debug, Clone)]
pub struct Token {
    pub tipo: TipoToken,
    pub linha: usize,
}

/// Tokeniza o código fonte inteiro. Qualquer trecho que o `logos` não
/// reconheça aborta a análise com a linha e o texto ofensivo.
pub fn escanear(fonte: &str) -> Result<Vec<Token>, ErroLexico> {
    let mut tokens = Vec::new();
    for (resultado, span) in TipoToken::lexer(fonte).spanned() {
        let linha = 1 + fonte[..span.start].matches('\n').count();
        match resultado {
            Ok(tipo) => tokens.push(Token { tipo, linha }),
            Err(()) => {
                return Err(ErroLexico {
                    linha,
                    lexema: fonte[span.start..span.end].to_string(),
                })
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tipos(fonte: &str) -> Vec<TipoToken> {
        escanear(fonte)
            .expect("fonte deveria tokenizar")
            .into_iter()
            .map(|t| t.tipo)
            .collect()
    }

    #[test]
    fn palavras_chave_e_identificadores() {
        assert_eq!(
            tipos("VAR idade = 30;"),
            vec![
                TipoToken::Var,
                TipoToken::Identificador("idade".to_string()),
                TipoToken::Igual,
                TipoToken::Inteiro(30),
                TipoToken::PontoVirgula,
            ]
        );
        // Prefixo de palavra-chave continua sendo identificador.
        assert_eq!(
            tipos("SENHA"),
            vec![TipoToken::Identificador("SENHA".to_string())]
        );
    }

    #[test]
    fn numeros_inteiros_e_fracionarios() {
        assert_eq!(
            tipos("1 2.5 10"),
            vec![
                TipoToken::Inteiro(1),
                TipoToken::Flutuante(2.5),
                TipoToken::Inteiro(10),
            ]
        );
    }

    #[test]
    fn operadores_compostos() {
        assert_eq!(
            tipos("++ -- <= >= == != && ||"),
            vec![
                TipoToken::MaisMais,
                TipoToken::MenosMenos,
                TipoToken::MenorIgual,
                TipoToken::MaiorIgual,
                TipoToken::IgualIgual,
                TipoToken::DiferenteDe,
                TipoToken::ELogico,
                TipoToken::OuLogico,
            ]
        );
    }

    #[test]
    fn comentarios_sao_ignorados() {
        assert_eq!(
            tipos("1 // até o fim da linha\n/* bloco\ninteiro */ 2"),
            vec![TipoToken::Inteiro(1), TipoToken::Inteiro(2)]
        );
    }

    #[test]
    fn linhas_sao_registradas() {
        let tokens = escanear("VAR a;\nVAR b;").expect("fonte deveria tokenizar");
        assert_eq!(tokens[0].linha, 1);
        assert_eq!(tokens[3].linha, 2);
    }

    #[test]
    fn caractere_invalido_falha_com_linha() {
        let erro = escanear("VAR a;\n@").expect_err("deveria falhar");
        assert_eq!(erro.linha, 2);
        assert_eq!(erro.lexema, "@");
    }
}
