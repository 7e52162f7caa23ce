use super::chunk::Chunk;
use super::opcode::OpCode;
use crate::ast::{Comando, Expressao, OperadorBinario, OperadorUnario};
use crate::erros::ErroCompilacao;
use crate::valor::Valor;

/// Tradutor da árvore sintática para bytecode, em passada única.
///
/// Saltos para a frente são emitidos com dois bytes 0xFF de reserva e
/// corrigidos quando o destino fica conhecido. A linha 0 marca os bytes
/// estruturais (saltos, OP_PRINT, os OP_POP de descarte, literais do
/// fonte, o OP_RETURN final); os demais — inclusive os bytes do LEIA e
/// do passo de `x++`/`x--` — carregam a linha do comando de origem.
pub struct Compilador {
    chunk: Chunk,
}

impl Default for Compilador {
    fn default() -> Self {
        Self::new()
    }
}

impl Compilador {
    pub fn new() -> Self {
        Self {
            chunk: Chunk::new(),
        }
    }

    /// Compila o programa inteiro. Tudo-ou-nada: qualquer erro descarta o
    /// chunk parcial. O OP_RETURN final garante que a VM sempre termina.
    pub fn compile(mut self, comandos: &[Comando]) -> Result<Chunk, ErroCompilacao> {
        for comando in comandos {
            self.compilar_comando(comando)?;
        }
        self.chunk.write_op(OpCode::Return, 0);
        Ok(self.chunk)
    }

    fn compilar_comando(&mut self, comando: &Comando) -> Result<(), ErroCompilacao> {
        match comando {
            Comando::DeclaracaoVar {
                nome,
                linha,
                inicializador,
            } => {
                match inicializador {
                    Some(expressao) => self.compilar_expressao(expressao)?,
                    None => self.chunk.write_op(OpCode::Nil, 0),
                }
                let indice = self.constante(Valor::Texto(nome.clone()))?;
                self.chunk.write_op(OpCode::DefineGlobal, *linha);
                self.chunk.write(indice, *linha);
            }
            Comando::Imprima(expressao) => {
                self.compilar_expressao(expressao)?;
                self.chunk.write_op(OpCode::Print, 0);
            }
            Comando::Leia { nome, linha } => {
                self.chunk.write_op(OpCode::Input, *linha);
                let indice = self.constante(Valor::Texto(nome.clone()))?;
                self.chunk.write_op(OpCode::SetGlobal, *linha);
                self.chunk.write(indice, *linha);
                self.chunk.write_op(OpCode::Pop, *linha);
            }
            Comando::Se {
                condicao,
                entao,
                senao,
            } => {
                self.compilar_expressao(condicao)?;
                // OP_JUMP_IF_FALSE apenas espia a condição: cada ramo começa
                // descartando-a com o OP_POP correspondente.
                let salto_senao = self.emitir_salto(OpCode::JumpIfFalse);
                self.chunk.write_op(OpCode::Pop, 0);
                self.compilar_comando(entao)?;
                let salto_fim = self.emitir_salto(OpCode::Jump);
                self.corrigir_salto(salto_senao)?;
                self.chunk.write_op(OpCode::Pop, 0);
                if let Some(comando) = senao {
                    self.compilar_comando(comando)?;
                }
                self.corrigir_salto(salto_fim)?;
            }
            Comando::Enquanto { condicao, corpo } => {
                let inicio = self.chunk.code.len();
                self.compilar_expressao(condicao)?;
                let salto_saida = self.emitir_salto(OpCode::JumpIfFalse);
                self.chunk.write_op(OpCode::Pop, 0);
                self.compilar_comando(corpo)?;
                self.emitir_laco(inicio)?;
                self.corrigir_salto(salto_saida)?;
                self.chunk.write_op(OpCode::Pop, 0);
            }
            Comando::Bloco(comandos) => {
                for comando in comandos {
                    self.compilar_comando(comando)?;
                }
            }
            Comando::Expressao(expressao) => {
                self.compilar_expressao(expressao)?;
                self.chunk.write_op(OpCode::Pop, 0);
            }
            // Sem geração de código: o backend de bytecode ainda não cobre
            // funções, retorno, PAREI nem ESCOLHEAI.
            Comando::Funcao { .. }
            | Comando::Retorne { .. }
            | Comando::Pare { .. }
            | Comando::Escolha { .. } => {}
        }
        Ok(())
    }

    fn compilar_expressao(&mut self, expressao: &Expressao) -> Result<(), ErroCompilacao> {
        match expressao {
            Expressao::Literal(valor) => match valor {
                Valor::Nulo => self.chunk.write_op(OpCode::Nil, 0),
                Valor::Booleano(true) => self.chunk.write_op(OpCode::True, 0),
                Valor::Booleano(false) => self.chunk.write_op(OpCode::False, 0),
                outro => {
                    let indice = self.constante(outro.clone())?;
                    self.chunk.write_op(OpCode::Constant, 0);
                    self.chunk.write(indice, 0);
                }
            },
            Expressao::Variavel { nome, linha } => {
                let indice = self.constante(Valor::Texto(nome.clone()))?;
                self.chunk.write_op(OpCode::GetGlobal, *linha);
                self.chunk.write(indice, *linha);
            }
            Expressao::Atribuicao { nome, linha, valor } => {
                self.compilar_expressao(valor)?;
                let indice = self.constante(Valor::Texto(nome.clone()))?;
                self.chunk.write_op(OpCode::SetGlobal, *linha);
                self.chunk.write(indice, *linha);
            }
            Expressao::Binaria {
                operador,
                linha,
                esquerda,
                direita,
            } => {
                self.compilar_expressao(esquerda)?;
                self.compilar_expressao(direita)?;
                self.compilar_operador(*operador, *linha)?;
            }
            Expressao::Unaria {
                operador,
                linha,
                operando,
            } => {
                self.compilar_expressao(operando)?;
                match operador {
                    OperadorUnario::Negacao => self.chunk.write_op(OpCode::Negate, *linha),
                    OperadorUnario::Nao => self.chunk.write_op(OpCode::Not, *linha),
                }
            }
            Expressao::Agrupamento(interna) => self.compilar_expressao(interna)?,
            // Chamadas ainda não têm instrução; ver Comando::Funcao.
            Expressao::Chamada { .. } => {}
            Expressao::Incremento { nome, linha, .. } => {
                self.compilar_passo(nome, *linha, OpCode::Add)?;
            }
            Expressao::Decremento { nome, linha, .. } => {
                self.compilar_passo(nome, *linha, OpCode::Subtract)?;
            }
        }
        Ok(())
    }

    /// `x++` e `x--` viram ler-somar-gravar sobre a global; prefixo e
    /// sufixo produzem o mesmo bytecode.
    fn compilar_passo(
        &mut self,
        nome: &str,
        linha: usize,
        operacao: OpCode,
    ) -> Result<(), ErroCompilacao> {
        let indice = self.constante(Valor::Texto(nome.to_string()))?;
        self.chunk.write_op(OpCode::GetGlobal, linha);
        self.chunk.write(indice, linha);
        let um = self.constante(Valor::Inteiro(1))?;
        self.chunk.write_op(OpCode::Constant, linha);
        self.chunk.write(um, linha);
        self.chunk.write_op(operacao, linha);
        self.chunk.write_op(OpCode::SetGlobal, linha);
        self.chunk.write(indice, linha);
        Ok(())
    }

    fn compilar_operador(
        &mut self,
        operador: OperadorBinario,
        linha: usize,
    ) -> Result<(), ErroCompilacao> {
        match operador {
            OperadorBinario::Soma => self.chunk.write_op(OpCode::Add, linha),
            OperadorBinario::Subtracao => self.chunk.write_op(OpCode::Subtract, linha),
            OperadorBinario::Multiplicacao => self.chunk.write_op(OpCode::Multiply, linha),
            OperadorBinario::Divisao => self.chunk.write_op(OpCode::Divide, linha),
            OperadorBinario::Igual => self.chunk.write_op(OpCode::Equal, linha),
            OperadorBinario::Maior => self.chunk.write_op(OpCode::Greater, linha),
            OperadorBinario::Menor => self.chunk.write_op(OpCode::Less, linha),
            OperadorBinario::Diferente => {
                self.chunk.write_op(OpCode::Equal, linha);
                self.chunk.write_op(OpCode::Not, linha);
            }
            OperadorBinario::MaiorIgual => {
                self.chunk.write_op(OpCode::Less, linha);
                self.chunk.write_op(OpCode::Not, linha);
            }
            OperadorBinario::MenorIgual => {
                self.chunk.write_op(OpCode::Greater, linha);
                self.chunk.write_op(OpCode::Not, linha);
            }
            OperadorBinario::Modulo | OperadorBinario::E | OperadorBinario::Ou => {
                return Err(ErroCompilacao::OperadorDesconhecido {
                    operador: operador.simbolo().to_string(),
                    linha,
                })
            }
        }
        Ok(())
    }

    fn constante(&mut self, valor: Valor) -> Result<u8, ErroCompilacao> {
        let indice = self.chunk.add_constant(valor);
        if indice > u8::MAX as usize {
            return Err(ErroCompilacao::ConstantesDemais { total: indice + 1 });
        }
        Ok(indice as u8)
    }

    /// Emite o salto com dois bytes de reserva e devolve o offset deles.
    fn emitir_salto(&mut self, op: OpCode) -> usize {
        self.chunk.write_op(op, 0);
        self.chunk.write(0xFF, 0);
        self.chunk.write(0xFF, 0);
        self.chunk.code.len() - 2
    }

    /// Preenche a reserva de `emitir_salto` com a distância até a posição
    /// atual, medida a partir do byte seguinte ao operando.
    fn corrigir_salto(&mut self, offset: usize) -> Result<(), ErroCompilacao> {
        let distancia = self.chunk.code.len() - offset - 2;
        if distancia > u16::MAX as usize {
            return Err(ErroCompilacao::SaltoMuitoLongo { distancia });
        }
        self.chunk.code[offset] = (distancia >> 8) as u8;
        self.chunk.code[offset + 1] = (distancia & 0xFF) as u8;
        Ok(())
    }

    /// Salto para trás, de volta ao teste do laço. A distância inclui os
    /// dois bytes do próprio operando.
    fn emitir_laco(&mut self, inicio: usize) -> Result<(), ErroCompilacao> {
        self.chunk.write_op(OpCode::Loop, 0);
        let distancia = self.chunk.code.len() - inicio + 2;
        if distancia > u16::MAX as usize {
            return Err(ErroCompilacao::LacoMuitoLongo { distancia });
        }
        self.chunk.write((distancia >> 8) as u8, 0);
        self.chunk.write((distancia & 0xFF) as u8, 0);
        Ok(())
    }
}
