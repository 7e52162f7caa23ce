use std::collections::HashMap;
use std::io::{BufRead, BufReader, Stdin, Stdout, Write};

use super::chunk::Chunk;
use super::opcode::OpCode;
use crate::erros::ErroExecucao;
use crate::valor::Valor;

/// Máquina de pilha que executa um chunk. A entrada e a saída são genéricas
/// para os testes trocarem o console por buffers.
///
/// Aritmética entre inteiros fica em inteiros (com estouro circular); na
/// presença de um flutuante o outro operando é promovido. O `+` com um
/// texto em qualquer lado concatena as formas exibidas dos dois valores.
pub struct VM<R, W> {
    pilha: Vec<Valor>,
    globais: HashMap<String, Valor>,
    entrada: R,
    saida: W,
    ip: usize,
}

impl VM<BufReader<Stdin>, Stdout> {
    /// VM ligada ao console do processo.
    pub fn novo() -> Self {
        Self::com_io(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl Default for VM<BufReader<Stdin>, Stdout> {
    fn default() -> Self {
        Self::novo()
    }
}

impl<R: BufRead, W: Write> VM<R, W> {
    pub fn com_io(entrada: R, saida: W) -> Self {
        Self {
            pilha: Vec::new(),
            globais: HashMap::new(),
            entrada,
            saida,
            ip: 0,
        }
    }

    /// Executa o chunk do início ao fim. O estado anterior da VM é
    /// descartado; um OP_RETURN (ou o fim do fluxo de bytes) encerra.
    pub fn interpretar(&mut self, chunk: &Chunk) -> Result<(), ErroExecucao> {
        self.ip = 0;
        self.pilha.clear();
        self.globais.clear();

        loop {
            if self.ip >= chunk.code.len() {
                return Ok(());
            }
            let byte = self.ler_byte(chunk)?;
            let op = OpCode::try_from(byte)
                .map_err(|b| self.erro(chunk, format!("Opcode desconhecido: {}", b)))?;

            match op {
                OpCode::Constant => {
                    let valor = self.constante(chunk)?;
                    self.pilha.push(valor);
                }
                OpCode::Nil => self.pilha.push(Valor::Nulo),
                OpCode::True => self.pilha.push(Valor::Booleano(true)),
                OpCode::False => self.pilha.push(Valor::Booleano(false)),
                OpCode::Pop => {
                    // Tolerante: comandos sem backend deixam a pilha como está.
                    let _ = self.pilha.pop();
                }
                OpCode::DefineGlobal => {
                    let nome = self.nome_global(chunk)?;
                    let valor = self.desempilhar(chunk)?;
                    self.globais.insert(nome, valor);
                }
                OpCode::GetGlobal => {
                    let nome = self.nome_global(chunk)?;
                    let valor = self.globais.get(&nome).cloned().ok_or_else(|| {
                        self.erro(chunk, format!("Variável indefinida '{}'.", nome))
                    })?;
                    self.pilha.push(valor);
                }
                OpCode::SetGlobal => {
                    let nome = self.nome_global(chunk)?;
                    if !self.globais.contains_key(&nome) {
                        return Err(
                            self.erro(chunk, format!("Variável indefinida '{}'.", nome))
                        );
                    }
                    // Espia em vez de desempilhar: a atribuição é uma
                    // expressão e seu valor pode encadear (a = b = 5).
                    let valor = self.topo(chunk)?.clone();
                    self.globais.insert(nome, valor);
                }
                OpCode::Negate => {
                    let valor = self.desempilhar(chunk)?;
                    let negado = match valor {
                        Valor::Inteiro(n) => Valor::Inteiro(n.wrapping_neg()),
                        Valor::Flutuante(x) => Valor::Flutuante(-x),
                        _ => {
                            return Err(
                                self.erro(chunk, "Operando deve ser um número.".to_string())
                            )
                        }
                    };
                    self.pilha.push(negado);
                }
                OpCode::Add => {
                    let (a, b) = self.operandos(chunk)?;
                    let soma = match (&a, &b) {
                        (Valor::Texto(_), _) | (_, Valor::Texto(_)) => {
                            Valor::Texto(format!("{}{}", a, b))
                        }
                        (Valor::Inteiro(x), Valor::Inteiro(y)) => {
                            Valor::Inteiro(x.wrapping_add(*y))
                        }
                        _ => self.promover(chunk, &a, &b, "+", |x, y| x + y)?,
                    };
                    self.pilha.push(soma);
                }
                OpCode::Subtract => {
                    let (a, b) = self.operandos(chunk)?;
                    let resultado = match (&a, &b) {
                        (Valor::Inteiro(x), Valor::Inteiro(y)) => {
                            Valor::Inteiro(x.wrapping_sub(*y))
                        }
                        _ => self.promover(chunk, &a, &b, "-", |x, y| x - y)?,
                    };
                    self.pilha.push(resultado);
                }
                OpCode::Multiply => {
                    let (a, b) = self.operandos(chunk)?;
                    let resultado = match (&a, &b) {
                        (Valor::Inteiro(x), Valor::Inteiro(y)) => {
                            Valor::Inteiro(x.wrapping_mul(*y))
                        }
                        _ => self.promover(chunk, &a, &b, "*", |x, y| x * y)?,
                    };
                    self.pilha.push(resultado);
                }
                OpCode::Divide => {
                    let (a, b) = self.operandos(chunk)?;
                    let resultado = match (&a, &b) {
                        (Valor::Inteiro(x), Valor::Inteiro(y)) => {
                            if *y == 0 {
                                return Err(
                                    self.erro(chunk, "Divisão por zero.".to_string())
                                );
                            }
                            Valor::Inteiro(x.wrapping_div(*y))
                        }
                        // Entre flutuantes a divisão por zero dá infinito.
                        _ => self.promover(chunk, &a, &b, "/", |x, y| x / y)?,
                    };
                    self.pilha.push(resultado);
                }
                OpCode::Not => {
                    let valor = self.desempilhar(chunk)?;
                    self.pilha.push(Valor::Booleano(!valor.eh_verdadeiro()));
                }
                OpCode::Equal => {
                    let (a, b) = self.operandos(chunk)?;
                    self.pilha.push(Valor::Booleano(a == b));
                }
                OpCode::Greater => {
                    let (a, b) = self.operandos(chunk)?;
                    let resultado = match (&a, &b) {
                        (Valor::Inteiro(x), Valor::Inteiro(y)) => x > y,
                        _ => {
                            let (x, y) = self.numericos(chunk, &a, &b, ">")?;
                            x > y
                        }
                    };
                    self.pilha.push(Valor::Booleano(resultado));
                }
                OpCode::Less => {
                    let (a, b) = self.operandos(chunk)?;
                    let resultado = match (&a, &b) {
                        (Valor::Inteiro(x), Valor::Inteiro(y)) => x < y,
                        _ => {
                            let (x, y) = self.numericos(chunk, &a, &b, "<")?;
                            x < y
                        }
                    };
                    self.pilha.push(Valor::Booleano(resultado));
                }
                OpCode::Print => {
                    let valor = self.desempilhar(chunk)?;
                    writeln!(self.saida, "{}", valor).map_err(|_| {
                        self.erro(chunk, "Falha ao escrever na saída.".to_string())
                    })?;
                }
                OpCode::Input => {
                    let valor = self.ler_entrada(chunk)?;
                    self.pilha.push(valor);
                }
                OpCode::Jump => {
                    let distancia = self.ler_u16(chunk)?;
                    self.ip += distancia;
                }
                OpCode::JumpIfFalse => {
                    let distancia = self.ler_u16(chunk)?;
                    // A condição fica na pilha: o OP_POP emparelhado em cada
                    // destino a descarta.
                    if !self.topo(chunk)?.eh_verdadeiro() {
                        self.ip += distancia;
                    }
                }
                OpCode::Loop => {
                    let distancia = self.ler_u16(chunk)?;
                    self.ip = self.ip.checked_sub(distancia).ok_or_else(|| {
                        self.erro(chunk, "Salto para trás inválido.".to_string())
                    })?;
                }
                OpCode::Return => return Ok(()),
            }
        }
    }

    fn erro(&self, chunk: &Chunk, mensagem: String) -> ErroExecucao {
        let linha = chunk
            .lines
            .get(self.ip.saturating_sub(1))
            .copied()
            .unwrap_or(0);
        ErroExecucao { mensagem, linha }
    }

    fn ler_byte(&mut self, chunk: &Chunk) -> Result<u8, ErroExecucao> {
        let byte = chunk
            .code
            .get(self.ip)
            .copied()
            .ok_or_else(|| self.erro(chunk, "Fim inesperado do bytecode.".to_string()))?;
        self.ip += 1;
        Ok(byte)
    }

    fn ler_u16(&mut self, chunk: &Chunk) -> Result<usize, ErroExecucao> {
        let alto = self.ler_byte(chunk)? as usize;
        let baixo = self.ler_byte(chunk)? as usize;
        Ok((alto << 8) | baixo)
    }

    fn constante(&mut self, chunk: &Chunk) -> Result<Valor, ErroExecucao> {
        let indice = self.ler_byte(chunk)? as usize;
        chunk
            .constants
            .get(indice)
            .cloned()
            .ok_or_else(|| self.erro(chunk, format!("Constante inválida: {}", indice)))
    }

    fn nome_global(&mut self, chunk: &Chunk) -> Result<String, ErroExecucao> {
        match self.constante(chunk)? {
            Valor::Texto(nome) => Ok(nome),
            _ => Err(self.erro(chunk, "Nome de variável inválido.".to_string())),
        }
    }

    fn desempilhar(&mut self, chunk: &Chunk) -> Result<Valor, ErroExecucao> {
        self.pilha
            .pop()
            .ok_or_else(|| self.erro(chunk, "Pilha de execução vazia.".to_string()))
    }

    fn topo(&self, chunk: &Chunk) -> Result<&Valor, ErroExecucao> {
        self.pilha
            .last()
            .ok_or_else(|| self.erro(chunk, "Pilha de execução vazia.".to_string()))
    }

    /// Desempilha os dois operandos de uma instrução binária, na ordem em
    /// que foram empilhados.
    fn operandos(&mut self, chunk: &Chunk) -> Result<(Valor, Valor), ErroExecucao> {
        let b = self.desempilhar(chunk)?;
        let a = self.desempilhar(chunk)?;
        Ok((a, b))
    }

    fn promover<F>(
        &self,
        chunk: &Chunk,
        a: &Valor,
        b: &Valor,
        simbolo: &str,
        operacao: F,
    ) -> Result<Valor, ErroExecucao>
    where
        F: Fn(f64, f64) -> f64,
    {
        match (a.como_f64(), b.como_f64()) {
            (Some(x), Some(y)) => Ok(Valor::Flutuante(operacao(x, y))),
            _ => Err(self.erro(chunk, format!("Operandos inválidos para '{}'.", simbolo))),
        }
    }

    /// Par numérico promovido para comparação mista; inteiro com inteiro é
    /// comparado direto, sem passar por aqui, para não perder precisão.
    fn numericos(
        &self,
        chunk: &Chunk,
        a: &Valor,
        b: &Valor,
        simbolo: &str,
    ) -> Result<(f64, f64), ErroExecucao> {
        match (a.como_f64(), b.como_f64()) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(self.erro(chunk, format!("Operandos inválidos para '{}'.", simbolo))),
        }
    }

    fn ler_entrada(&mut self, chunk: &Chunk) -> Result<Valor, ErroExecucao> {
        write!(self.saida, "> ")
            .and_then(|_| self.saida.flush())
            .map_err(|_| self.erro(chunk, "Falha ao escrever na saída.".to_string()))?;

        let mut linha = String::new();
        self.entrada
            .read_line(&mut linha)
            .map_err(|_| self.erro(chunk, "Falha ao ler da entrada.".to_string()))?;
        let texto = linha.trim_end_matches(['\n', '\r']);

        // Inteiro quando couber, senão flutuante, senão o texto cru.
        if let Ok(n) = texto.parse::<i64>() {
            return Ok(Valor::Inteiro(n));
        }
        if let Ok(x) = texto.parse::<f64>() {
            return Ok(Valor::Flutuante(x));
        }
        Ok(Valor::Texto(texto.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Comando, Expressao, OperadorBinario};
    use crate::bytecode::Compilador;
    use std::io::Cursor;

    fn executar(programa: &[Comando], entrada: &str) -> Result<String, ErroExecucao> {
        let chunk = Compilador::new()
            .compile(programa)
            .expect("programa deveria compilar");
        let mut saida = Vec::new();
        let resultado = {
            let mut vm = VM::com_io(Cursor::new(entrada.to_string()), &mut saida);
            vm.interpretar(&chunk)
        };
        resultado.map(|_| String::from_utf8(saida).expect("saída deveria ser UTF-8"))
    }

    fn variavel(nome: &str, linha: usize) -> Expressao {
        Expressao::Variavel {
            nome: nome.to_string(),
            linha,
        }
    }

    fn binaria(
        operador: OperadorBinario,
        linha: usize,
        esquerda: Expressao,
        direita: Expressao,
    ) -> Expressao {
        Expressao::Binaria {
            operador,
            linha,
            esquerda: Box::new(esquerda),
            direita: Box::new(direita),
        }
    }

    #[test]
    fn soma_de_global_com_literal() {
        // VAR x = 10; ESCREVEAI x + 5;
        let programa = vec![
            Comando::DeclaracaoVar {
                nome: "x".to_string(),
                linha: 1,
                inicializador: Some(Expressao::Literal(Valor::Inteiro(10))),
            },
            Comando::Imprima(binaria(
                OperadorBinario::Soma,
                2,
                variavel("x", 2),
                Expressao::Literal(Valor::Inteiro(5)),
            )),
        ];
        assert_eq!(executar(&programa, "").expect("deveria executar"), "15\n");
    }

    #[test]
    fn se_senao_escolhe_o_ramo_falso() {
        // VAR x = 1; SE (x > 2) { ESCREVEAI "a"; } SENAO { ESCREVEAI "b"; }
        let programa = vec![
            Comando::DeclaracaoVar {
                nome: "x".to_string(),
                linha: 1,
                inicializador: Some(Expressao::Literal(Valor::Inteiro(1))),
            },
            Comando::Se {
                condicao: binaria(
                    OperadorBinario::Maior,
                    2,
                    variavel("x", 2),
                    Expressao::Literal(Valor::Inteiro(2)),
                ),
                entao: Box::new(Comando::Imprima(Expressao::Literal(Valor::Texto(
                    "a".to_string(),
                )))),
                senao: Some(Box::new(Comando::Imprima(Expressao::Literal(
                    Valor::Texto("b".to_string()),
                )))),
            },
        ];
        assert_eq!(executar(&programa, "").expect("deveria executar"), "b\n");
    }

    #[test]
    fn laco_conta_ate_tres() {
        // VAR i = 0; VOLTAINFINITA (i < 3) { ESCREVEAI i; i = i + 1; }
        let programa = vec![
            Comando::DeclaracaoVar {
                nome: "i".to_string(),
                linha: 1,
                inicializador: Some(Expressao::Literal(Valor::Inteiro(0))),
            },
            Comando::Enquanto {
                condicao: binaria(
                    OperadorBinario::Menor,
                    2,
                    variavel("i", 2),
                    Expressao::Literal(Valor::Inteiro(3)),
                ),
                corpo: Box::new(Comando::Bloco(vec![
                    Comando::Imprima(variavel("i", 3)),
                    Comando::Expressao(Expressao::Atribuicao {
                        nome: "i".to_string(),
                        linha: 4,
                        valor: Box::new(binaria(
                            OperadorBinario::Soma,
                            4,
                            variavel("i", 4),
                            Expressao::Literal(Valor::Inteiro(1)),
                        )),
                    }),
                ])),
            },
        ];
        assert_eq!(
            executar(&programa, "").expect("deveria executar"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn leitura_do_console_com_prompt() {
        // LEIA n; ESCREVEAI n + 1;
        let programa = vec![
            Comando::DeclaracaoVar {
                nome: "n".to_string(),
                linha: 1,
                inicializador: None,
            },
            Comando::Leia {
                nome: "n".to_string(),
                linha: 2,
            },
            Comando::Imprima(binaria(
                OperadorBinario::Soma,
                3,
                variavel("n", 3),
                Expressao::Literal(Valor::Inteiro(1)),
            )),
        ];
        assert_eq!(
            executar(&programa, "41\n").expect("deveria executar"),
            "> 42\n"
        );
    }

    #[test]
    fn entrada_escolhe_o_tipo_mais_especifico() {
        let programa = vec![
            Comando::DeclaracaoVar {
                nome: "v".to_string(),
                linha: 1,
                inicializador: None,
            },
            Comando::Leia {
                nome: "v".to_string(),
                linha: 2,
            },
            Comando::Imprima(variavel("v", 3)),
        ];
        assert_eq!(
            executar(&programa, "2.5\n").expect("deveria executar"),
            "> 2.5\n"
        );
        assert_eq!(
            executar(&programa, "oi\n").expect("deveria executar"),
            "> oi\n"
        );
    }

    #[test]
    fn soma_promove_inteiro_para_flutuante() {
        let programa = vec![Comando::Imprima(binaria(
            OperadorBinario::Soma,
            1,
            Expressao::Literal(Valor::Inteiro(2)),
            Expressao::Literal(Valor::Flutuante(3.5)),
        ))];
        assert_eq!(executar(&programa, "").expect("deveria executar"), "5.5\n");
    }

    #[test]
    fn soma_com_texto_concatena() {
        let programa = vec![Comando::Imprima(binaria(
            OperadorBinario::Soma,
            1,
            Expressao::Literal(Valor::Texto("a".to_string())),
            Expressao::Literal(Valor::Inteiro(1)),
        ))];
        assert_eq!(executar(&programa, "").expect("deveria executar"), "a1\n");
    }

    #[test]
    fn variavel_indefinida_reporta_a_linha() {
        // VAR x = 1;
        // ESCREVEAI y + 1;
        let programa = vec![
            Comando::DeclaracaoVar {
                nome: "x".to_string(),
                linha: 1,
                inicializador: Some(Expressao::Literal(Valor::Inteiro(1))),
            },
            Comando::Imprima(binaria(
                OperadorBinario::Soma,
                2,
                variavel("y", 2),
                Expressao::Literal(Valor::Inteiro(1)),
            )),
        ];
        let erro = executar(&programa, "").expect_err("deveria falhar");
        assert_eq!(erro.mensagem, "Variável indefinida 'y'.");
        assert_eq!(erro.linha, 2);
    }

    #[test]
    fn atribuicao_encadeada_propaga_o_valor() {
        // VAR a; VAR b; a = b = 5; ESCREVEAI a; ESCREVEAI b;
        let programa = vec![
            Comando::DeclaracaoVar {
                nome: "a".to_string(),
                linha: 1,
                inicializador: None,
            },
            Comando::DeclaracaoVar {
                nome: "b".to_string(),
                linha: 1,
                inicializador: None,
            },
            Comando::Expressao(Expressao::Atribuicao {
                nome: "a".to_string(),
                linha: 2,
                valor: Box::new(Expressao::Atribuicao {
                    nome: "b".to_string(),
                    linha: 2,
                    valor: Box::new(Expressao::Literal(Valor::Inteiro(5))),
                }),
            }),
            Comando::Imprima(variavel("a", 3)),
            Comando::Imprima(variavel("b", 4)),
        ];
        assert_eq!(
            executar(&programa, "").expect("deveria executar"),
            "5\n5\n"
        );
    }

    #[test]
    fn divisao_inteira_por_zero_falha() {
        let programa = vec![Comando::Imprima(binaria(
            OperadorBinario::Divisao,
            1,
            Expressao::Literal(Valor::Inteiro(1)),
            Expressao::Literal(Valor::Inteiro(0)),
        ))];
        let erro = executar(&programa, "").expect_err("deveria falhar");
        assert_eq!(erro.mensagem, "Divisão por zero.");
    }

    #[test]
    fn comparacao_de_inteiros_fica_no_dominio_inteiro() {
        // Vizinhos acima de 2^53 colapsariam no mesmo f64; a comparação
        // entre inteiros não pode passar pela promoção.
        let programa = vec![Comando::Imprima(binaria(
            OperadorBinario::Maior,
            1,
            Expressao::Literal(Valor::Inteiro(9_007_199_254_740_993)),
            Expressao::Literal(Valor::Inteiro(9_007_199_254_740_992)),
        ))];
        assert_eq!(
            executar(&programa, "").expect("deveria executar"),
            "verdadeiro\n"
        );

        let programa = vec![Comando::Imprima(binaria(
            OperadorBinario::Menor,
            1,
            Expressao::Literal(Valor::Inteiro(9_007_199_254_740_993)),
            Expressao::Literal(Valor::Inteiro(9_007_199_254_740_992)),
        ))];
        assert_eq!(
            executar(&programa, "").expect("deveria executar"),
            "falso\n"
        );
    }

    #[test]
    fn comparacao_mista_promove_para_flutuante() {
        let programa = vec![Comando::Imprima(binaria(
            OperadorBinario::Menor,
            1,
            Expressao::Literal(Valor::Inteiro(2)),
            Expressao::Literal(Valor::Flutuante(2.5)),
        ))];
        assert_eq!(
            executar(&programa, "").expect("deveria executar"),
            "verdadeiro\n"
        );
    }

    #[test]
    fn igualdade_estrita_entre_inteiro_e_flutuante() {
        let programa = vec![Comando::Imprima(binaria(
            OperadorBinario::Igual,
            1,
            Expressao::Literal(Valor::Inteiro(3)),
            Expressao::Literal(Valor::Flutuante(3.0)),
        ))];
        assert_eq!(
            executar(&programa, "").expect("deveria executar"),
            "falso\n"
        );
    }

    #[test]
    fn incremento_e_decremento_de_global() {
        // VAR n = 5; n++; ESCREVEAI n; --n; ESCREVEAI n;
        let programa = vec![
            Comando::DeclaracaoVar {
                nome: "n".to_string(),
                linha: 1,
                inicializador: Some(Expressao::Literal(Valor::Inteiro(5))),
            },
            Comando::Expressao(Expressao::Incremento {
                nome: "n".to_string(),
                linha: 2,
                prefixo: false,
            }),
            Comando::Imprima(variavel("n", 3)),
            Comando::Expressao(Expressao::Decremento {
                nome: "n".to_string(),
                linha: 4,
                prefixo: true,
            }),
            Comando::Imprima(variavel("n", 5)),
        ];
        assert_eq!(
            executar(&programa, "").expect("deveria executar"),
            "6\n5\n"
        );
    }

    #[test]
    fn negacao_de_tipo_errado_falha() {
        let programa = vec![Comando::Imprima(Expressao::Unaria {
            operador: crate::ast::OperadorUnario::Negacao,
            linha: 1,
            operando: Box::new(Expressao::Literal(Valor::Texto("x".to_string()))),
        })];
        let erro = executar(&programa, "").expect_err("deveria falhar");
        assert_eq!(erro.mensagem, "Operando deve ser um número.");
    }
}
