use std::mem;

use crate::ast::{CasoEscolha, Comando, Expressao, OperadorBinario, OperadorUnario};
use crate::erros::ErroSintaxe;
use crate::lexer::{TipoToken, Token};
use crate::valor::Valor;

/// Analisador sintático descendente recursivo. Consome a lista de tokens e
/// produz a lista de comandos do programa; o primeiro erro aborta a análise.
pub struct Analisador {
    tokens: Vec<Token>,
    atual: usize,
}

impl Analisador {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, atual: 0 }
    }

    pub fn analisar(mut self) -> Result<Vec<Comando>, ErroSintaxe> {
        let mut comandos = Vec::new();
        while !self.fim() {
            comandos.push(self.declaracao()?);
        }
        Ok(comandos)
    }

    // ---- navegação ----

    fn fim(&self) -> bool {
        self.atual >= self.tokens.len()
    }

    fn espiar(&self) -> Option<&TipoToken> {
        self.tokens.get(self.atual).map(|t| &t.tipo)
    }

    fn linha_atual(&self) -> usize {
        self.tokens
            .get(self.atual)
            .or_else(|| self.tokens.last())
            .map(|t| t.linha)
            .unwrap_or(1)
    }

    fn linha_anterior(&self) -> usize {
        self.tokens
            .get(self.atual.saturating_sub(1))
            .map(|t| t.linha)
            .unwrap_or(1)
    }

    fn avancar(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.atual).cloned();
        if token.is_some() {
            self.atual += 1;
        }
        token
    }

    /// Compara só a variante, ignorando o conteúdo de literais e nomes.
    fn verificar(&self, tipo: &TipoToken) -> bool {
        self.espiar()
            .map(|t| mem::discriminant(t) == mem::discriminant(tipo))
            .unwrap_or(false)
    }

    fn casar(&mut self, tipo: &TipoToken) -> bool {
        if self.verificar(tipo) {
            self.atual += 1;
            true
        } else {
            false
        }
    }

    fn consumir(&mut self, tipo: &TipoToken, mensagem: &str) -> Result<Token, ErroSintaxe> {
        if self.verificar(tipo) {
            self.avancar().ok_or_else(|| self.erro(mensagem))
        } else {
            Err(self.erro(mensagem))
        }
    }

    fn identificador(&mut self, mensagem: &str) -> Result<(String, usize), ErroSintaxe> {
        match self.espiar() {
            Some(TipoToken::Identificador(nome)) => {
                let nome = nome.clone();
                let linha = self.linha_atual();
                self.atual += 1;
                Ok((nome, linha))
            }
            _ => Err(self.erro(mensagem)),
        }
    }

    fn erro(&self, mensagem: &str) -> ErroSintaxe {
        ErroSintaxe {
            linha: self.linha_atual(),
            mensagem: mensagem.to_string(),
        }
    }

    // ---- declarações e comandos ----

    fn declaracao(&mut self) -> Result<Comando, ErroSintaxe> {
        if self.casar(&TipoToken::Var) {
            return self.declaracao_var();
        }
        if self.casar(&TipoToken::Funcao) {
            return self.declaracao_funcao();
        }
        self.comando()
    }

    fn declaracao_var(&mut self) -> Result<Comando, ErroSintaxe> {
        let (nome, linha) = self.identificador("Esperado nome da variável após VAR.")?;
        let inicializador = if self.casar(&TipoToken::Igual) {
            Some(self.expressao()?)
        } else {
            None
        };
        self.consumir(
            &TipoToken::PontoVirgula,
            "Esperado ';' após a declaração da variável.",
        )?;
        Ok(Comando::DeclaracaoVar {
            nome,
            linha,
            inicializador,
        })
    }

    fn declaracao_funcao(&mut self) -> Result<Comando, ErroSintaxe> {
        let (nome, linha) = self.identificador("Esperado nome da função após FUNCAO.")?;
        self.consumir(&TipoToken::ParenEsq, "Esperado '(' após o nome da função.")?;
        let mut parametros = Vec::new();
        if !self.verificar(&TipoToken::ParenDir) {
            loop {
                let (parametro, _) = self.identificador("Esperado nome do parâmetro.")?;
                parametros.push(parametro);
                if !self.casar(&TipoToken::Virgula) {
                    break;
                }
            }
        }
        self.consumir(&TipoToken::ParenDir, "Esperado ')' após os parâmetros.")?;
        self.consumir(&TipoToken::ChaveEsq, "Esperado '{' antes do corpo da função.")?;
        let corpo = self.bloco()?;
        Ok(Comando::Funcao {
            nome,
            linha,
            parametros,
            corpo,
        })
    }

    fn comando(&mut self) -> Result<Comando, ErroSintaxe> {
        if self.casar(&TipoToken::Escreveai) {
            let expressao = self.expressao()?;
            self.consumir(&TipoToken::PontoVirgula, "Esperado ';' após ESCREVEAI.")?;
            return Ok(Comando::Imprima(expressao));
        }
        if self.casar(&TipoToken::Leia) {
            let (nome, linha) = self.identificador("Esperado nome da variável após LEIA.")?;
            self.consumir(&TipoToken::PontoVirgula, "Esperado ';' após LEIA.")?;
            return Ok(Comando::Leia { nome, linha });
        }
        if self.casar(&TipoToken::Se) {
            return self.comando_se();
        }
        if self.casar(&TipoToken::Voltainfinita) {
            return self.comando_enquanto();
        }
        if self.casar(&TipoToken::Fazavolta) {
            return self.comando_fazavolta();
        }
        if self.casar(&TipoToken::Retorna) {
            let linha = self.linha_anterior();
            let valor = if self.verificar(&TipoToken::PontoVirgula) {
                None
            } else {
                Some(self.expressao()?)
            };
            self.consumir(&TipoToken::PontoVirgula, "Esperado ';' após RETORNA.")?;
            return Ok(Comando::Retorne { valor, linha });
        }
        if self.casar(&TipoToken::Parei) {
            let linha = self.linha_anterior();
            self.consumir(&TipoToken::PontoVirgula, "Esperado ';' após PAREI.")?;
            return Ok(Comando::Pare { linha });
        }
        if self.casar(&TipoToken::Escolheai) {
            return self.comando_escolha();
        }
        if self.casar(&TipoToken::ChaveEsq) {
            return Ok(Comando::Bloco(self.bloco()?));
        }
        let expressao = self.expressao()?;
        self.consumir(&TipoToken::PontoVirgula, "Esperado ';' após a expressão.")?;
        Ok(Comando::Expressao(expressao))
    }

    /// Corpo de bloco; o '{' de abertura já foi consumido.
    fn bloco(&mut self) -> Result<Vec<Comando>, ErroSintaxe> {
        let mut comandos = Vec::new();
        while !self.verificar(&TipoToken::ChaveDir) && !self.fim() {
            comandos.push(self.declaracao()?);
        }
        self.consumir(&TipoToken::ChaveDir, "Esperado '}' para fechar o bloco.")?;
        Ok(comandos)
    }

    fn comando_se(&mut self) -> Result<Comando, ErroSintaxe> {
        self.consumir(&TipoToken::ParenEsq, "Esperado '(' após SE.")?;
        let condicao = self.expressao()?;
        self.consumir(&TipoToken::ParenDir, "Esperado ')' após a condição.")?;
        let entao = Box::new(self.comando()?);
        let senao = if self.casar(&TipoToken::Senao) {
            Some(Box::new(self.comando()?))
        } else {
            None
        };
        Ok(Comando::Se {
            condicao,
            entao,
            senao,
        })
    }

    fn comando_enquanto(&mut self) -> Result<Comando, ErroSintaxe> {
        self.consumir(&TipoToken::ParenEsq, "Esperado '(' após VOLTAINFINITA.")?;
        let condicao = self.expressao()?;
        self.consumir(&TipoToken::ParenDir, "Esperado ')' após a condição.")?;
        let corpo = Box::new(self.comando()?);
        Ok(Comando::Enquanto { condicao, corpo })
    }

    /// FAZAVOLTA vira açúcar sintático sobre VOLTAINFINITA: o inicializador
    /// abre um bloco e o passo é anexado ao fim do corpo.
    fn comando_fazavolta(&mut self) -> Result<Comando, ErroSintaxe> {
        self.consumir(&TipoToken::ParenEsq, "Esperado '(' após FAZAVOLTA.")?;

        let inicializador = if self.casar(&TipoToken::PontoVirgula) {
            None
        } else if self.casar(&TipoToken::Var) {
            Some(self.declaracao_var()?)
        } else {
            let expressao = self.expressao()?;
            self.consumir(&TipoToken::PontoVirgula, "Esperado ';' após o inicializador.")?;
            Some(Comando::Expressao(expressao))
        };

        let condicao = if self.verificar(&TipoToken::PontoVirgula) {
            Expressao::Literal(Valor::Booleano(true))
        } else {
            self.expressao()?
        };
        self.consumir(&TipoToken::PontoVirgula, "Esperado ';' após a condição.")?;

        let passo = if self.verificar(&TipoToken::ParenDir) {
            None
        } else {
            Some(self.expressao()?)
        };
        self.consumir(&TipoToken::ParenDir, "Esperado ')' após FAZAVOLTA.")?;

        let mut corpo = self.comando()?;
        if let Some(passo) = passo {
            corpo = Comando::Bloco(vec![corpo, Comando::Expressao(passo)]);
        }
        let laco = Comando::Enquanto {
            condicao,
            corpo: Box::new(corpo),
        };
        Ok(match inicializador {
            Some(inicializador) => Comando::Bloco(vec![inicializador, laco]),
            None => laco,
        })
    }

    fn comando_escolha(&mut self) -> Result<Comando, ErroSintaxe> {
        let linha = self.linha_anterior();
        self.consumir(&TipoToken::ParenEsq, "Esperado '(' após ESCOLHEAI.")?;
        let alvo = self.expressao()?;
        self.consumir(&TipoToken::ParenDir, "Esperado ')' após o valor.")?;
        self.consumir(&TipoToken::ChaveEsq, "Esperado '{' após ESCOLHEAI.")?;

        let mut casos = Vec::new();
        let mut padrao = None;
        while !self.verificar(&TipoToken::ChaveDir) && !self.fim() {
            if self.casar(&TipoToken::Caso) {
                let valor = self.expressao()?;
                self.consumir(&TipoToken::DoisPontos, "Esperado ':' após CASO.")?;
                casos.push(CasoEscolha {
                    valor,
                    corpo: self.corpo_de_caso()?,
                });
            } else if self.casar(&TipoToken::Padrao) {
                self.consumir(&TipoToken::DoisPontos, "Esperado ':' após PADRAO.")?;
                padrao = Some(self.corpo_de_caso()?);
            } else {
                return Err(self.erro("Esperado CASO ou PADRAO dentro de ESCOLHEAI."));
            }
        }
        self.consumir(&TipoToken::ChaveDir, "Esperado '}' para fechar ESCOLHEAI.")?;
        Ok(Comando::Escolha {
            alvo,
            casos,
            padrao,
            linha,
        })
    }

    fn corpo_de_caso(&mut self) -> Result<Vec<Comando>, ErroSintaxe> {
        let mut comandos = Vec::new();
        while !self.verificar(&TipoToken::Caso)
            && !self.verificar(&TipoToken::Padrao)
            && !self.verificar(&TipoToken::ChaveDir)
            && !self.fim()
        {
            comandos.push(self.declaracao()?);
        }
        Ok(comandos)
    }

    // ---- expressões, da menor para a maior precedência ----

    fn expressao(&mut self) -> Result<Expressao, ErroSintaxe> {
        self.atribuicao()
    }

    fn atribuicao(&mut self) -> Result<Expressao, ErroSintaxe> {
        let expressao = self.ou()?;
        if self.casar(&TipoToken::Igual) {
            let linha = self.linha_anterior();
            let valor = self.atribuicao()?;
            return match expressao {
                Expressao::Variavel { nome, .. } => Ok(Expressao::Atribuicao {
                    nome,
                    linha,
                    valor: Box::new(valor),
                }),
                _ => Err(ErroSintaxe {
                    linha,
                    mensagem: "Alvo de atribuição inválido.".to_string(),
                }),
            };
        }
        Ok(expressao)
    }

    fn ou(&mut self) -> Result<Expressao, ErroSintaxe> {
        self.binaria_esquerda(Self::e, &[(TipoToken::OuLogico, OperadorBinario::Ou)])
    }

    fn e(&mut self) -> Result<Expressao, ErroSintaxe> {
        self.binaria_esquerda(Self::igualdade, &[(TipoToken::ELogico, OperadorBinario::E)])
    }

    fn igualdade(&mut self) -> Result<Expressao, ErroSintaxe> {
        self.binaria_esquerda(
            Self::comparacao,
            &[
                (TipoToken::IgualIgual, OperadorBinario::Igual),
                (TipoToken::DiferenteDe, OperadorBinario::Diferente),
            ],
        )
    }

    fn comparacao(&mut self) -> Result<Expressao, ErroSintaxe> {
        self.binaria_esquerda(
            Self::termo,
            &[
                (TipoToken::Maior, OperadorBinario::Maior),
                (TipoToken::MaiorIgual, OperadorBinario::MaiorIgual),
                (TipoToken::Menor, OperadorBinario::Menor),
                (TipoToken::MenorIgual, OperadorBinario::MenorIgual),
            ],
        )
    }

    fn termo(&mut self) -> Result<Expressao, ErroSintaxe> {
        self.binaria_esquerda(
            Self::fator,
            &[
                (TipoToken::Mais, OperadorBinario::Soma),
                (TipoToken::Menos, OperadorBinario::Subtracao),
            ],
        )
    }

    fn fator(&mut self) -> Result<Expressao, ErroSintaxe> {
        self.binaria_esquerda(
            Self::unario,
            &[
                (TipoToken::Estrela, OperadorBinario::Multiplicacao),
                (TipoToken::Barra, OperadorBinario::Divisao),
                (TipoToken::Porcento, OperadorBinario::Modulo),
            ],
        )
    }

    /// Nível binário associativo à esquerda, parametrizado pela tabela de
    /// operadores e pelo nível imediatamente mais apertado.
    fn binaria_esquerda(
        &mut self,
        proximo: fn(&mut Self) -> Result<Expressao, ErroSintaxe>,
        tabela: &[(TipoToken, OperadorBinario)],
    ) -> Result<Expressao, ErroSintaxe> {
        let mut expressao = proximo(self)?;
        'externo: loop {
            for (tipo, operador) in tabela {
                if self.casar(tipo) {
                    let linha = self.linha_anterior();
                    let direita = proximo(self)?;
                    expressao = Expressao::Binaria {
                        operador: *operador,
                        linha,
                        esquerda: Box::new(expressao),
                        direita: Box::new(direita),
                    };
                    continue 'externo;
                }
            }
            return Ok(expressao);
        }
    }

    fn unario(&mut self) -> Result<Expressao, ErroSintaxe> {
        if self.casar(&TipoToken::Exclamacao) {
            let linha = self.linha_anterior();
            return Ok(Expressao::Unaria {
                operador: OperadorUnario::Nao,
                linha,
                operando: Box::new(self.unario()?),
            });
        }
        if self.casar(&TipoToken::Menos) {
            let linha = self.linha_anterior();
            return Ok(Expressao::Unaria {
                operador: OperadorUnario::Negacao,
                linha,
                operando: Box::new(self.unario()?),
            });
        }
        if self.casar(&TipoToken::MaisMais) {
            let (nome, linha) = self.identificador("Esperado variável após '++'.")?;
            return Ok(Expressao::Incremento {
                nome,
                linha,
                prefixo: true,
            });
        }
        if self.casar(&TipoToken::MenosMenos) {
            let (nome, linha) = self.identificador("Esperado variável após '--'.")?;
            return Ok(Expressao::Decremento {
                nome,
                linha,
                prefixo: true,
            });
        }
        self.chamada()
    }

    fn chamada(&mut self) -> Result<Expressao, ErroSintaxe> {
        let mut expressao = self.primario()?;
        loop {
            if self.casar(&TipoToken::ParenEsq) {
                let linha = self.linha_anterior();
                let mut argumentos = Vec::new();
                if !self.verificar(&TipoToken::ParenDir) {
                    loop {
                        argumentos.push(self.expressao()?);
                        if !self.casar(&TipoToken::Virgula) {
                            break;
                        }
                    }
                }
                self.consumir(&TipoToken::ParenDir, "Esperado ')' após os argumentos.")?;
                expressao = Expressao::Chamada {
                    alvo: Box::new(expressao),
                    argumentos,
                    linha,
                };
            } else if self.verificar(&TipoToken::MaisMais) || self.verificar(&TipoToken::MenosMenos)
            {
                // Sufixo só faz sentido sobre uma variável.
                match expressao {
                    Expressao::Variavel { nome, linha } => {
                        let incremento = self.casar(&TipoToken::MaisMais);
                        if !incremento {
                            self.casar(&TipoToken::MenosMenos);
                        }
                        expressao = if incremento {
                            Expressao::Incremento {
                                nome,
                                linha,
                                prefixo: false,
                            }
                        } else {
                            Expressao::Decremento {
                                nome,
                                linha,
                                prefixo: false,
                            }
                        };
                    }
                    outra => return Ok(outra),
                }
            } else {
                return Ok(expressao);
            }
        }
    }

    fn primario(&mut self) -> Result<Expressao, ErroSintaxe> {
        let linha = self.linha_atual();
        match self.espiar() {
            Some(TipoToken::Inteiro(n)) => {
                let n = *n;
                self.atual += 1;
                Ok(Expressao::Literal(Valor::Inteiro(n)))
            }
            Some(TipoToken::Flutuante(x)) => {
                let x = *x;
                self.atual += 1;
                Ok(Expressao::Literal(Valor::Flutuante(x)))
            }
            Some(TipoToken::Texto(s)) => {
                let s = s.clone();
                self.atual += 1;
                Ok(Expressao::Literal(Valor::Texto(s)))
            }
            Some(TipoToken::Issoai) => {
                self.atual += 1;
                Ok(Expressao::Literal(Valor::Booleano(true)))
            }
            Some(TipoToken::Mentira) => {
                self.atual += 1;
                Ok(Expressao::Literal(Valor::Booleano(false)))
            }
            Some(TipoToken::Nulo) => {
                self.atual += 1;
                Ok(Expressao::Literal(Valor::Nulo))
            }
            Some(TipoToken::Identificador(nome)) => {
                let nome = nome.clone();
                self.atual += 1;
                Ok(Expressao::Variavel { nome, linha })
            }
            Some(TipoToken::ParenEsq) => {
                self.atual += 1;
                let interna = self.expressao()?;
                self.consumir(&TipoToken::ParenDir, "Esperado ')' após a expressão.")?;
                Ok(Expressao::Agrupamento(Box::new(interna)))
            }
            _ => Err(self.erro("Expressão esperada.")),
        }
    }
}
