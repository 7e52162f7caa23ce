use std::fmt;

/// Conjunto fechado de instruções da VM. Cada variante documenta o formato
/// dos operandos no fluxo de bytes e o efeito sobre a pilha.
///
/// `>=`, `<=` e `!=` não existem como instrução: o compilador os emite como
/// `OP_LESS; OP_NOT`, `OP_GREATER; OP_NOT` e `OP_EQUAL; OP_NOT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Operando: índice de 1 byte no pool. Empilha a constante.
    Constant = 0,
    Nil,
    True,
    False,
    /// Descarta o topo da pilha.
    Pop,
    /// Operando: índice do nome no pool. Desempilha e define a global.
    DefineGlobal,
    /// Operando: índice do nome no pool. Empilha o valor; falha se indefinida.
    GetGlobal,
    /// Operando: índice do nome no pool. Grava o topo SEM desempilhar, para
    /// permitir atribuição encadeada; falha se indefinida.
    SetGlobal,
    Negate,
    Add,
    Subtract,
    Multiply,
    Divide,
    Not,
    Equal,
    Greater,
    Less,
    /// Desempilha, converte para texto e escreve uma linha na saída.
    Print,
    /// Escreve o prompt "> ", lê uma linha do console e empilha o valor.
    Input,
    /// Operando: distância de 2 bytes (big-endian). `ip += distância`.
    Jump,
    /// Operando: distância de 2 bytes. Salta se o topo for falso, SEM
    /// desempilhar — quem emite precisa emparelhar com um OP_POP adiante.
    JumpIfFalse,
    /// Operando: distância de 2 bytes. `ip -= distância`, sempre para trás.
    Loop,
    /// Encerra a execução com sucesso.
    Return,
}

impl OpCode {
    /// Mnemônico usado pelo desmontador.
    pub fn nome(&self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Pop => "OP_POP",
            OpCode::DefineGlobal => "OP_DEFINE_GLOBAL",
            OpCode::GetGlobal => "OP_GET_GLOBAL",
            OpCode::SetGlobal => "OP_SET_GLOBAL",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Not => "OP_NOT",
            OpCode::Equal => "OP_EQUAL",
            OpCode::Greater => "OP_GREATER",
            OpCode::Less => "OP_LESS",
            OpCode::Print => "OP_PRINT",
            OpCode::Input => "OP_INPUT",
            OpCode::Jump => "OP_JUMP",
            OpCode::JumpIfFalse => "OP_JUMP_IF_FALSE",
            OpCode::Loop => "OP_LOOP",
            OpCode::Return => "OP_RETURN",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.nome())
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        Ok(match byte {
            0 => OpCode::Constant,
            1 => OpCode::Nil,
            2 => OpCode::True,
            3 => OpCode::False,
            4 => OpCode::Pop,
            5 => OpCode::DefineGlobal,
            6 => OpCode::GetGlobal,
            7 => OpCode::SetGlobal,
            8 => OpCode::Negate,
            9 => OpCode::Add,
            10 => OpCode::Subtract,
            11 => OpCode::Multiply,
            12 => OpCode::Divide,
            13 => OpCode::Not,
            14 => OpCode::Equal,
            15 => OpCode::Greater,
            16 => OpCode::Less,
            17 => OpCode::Print,
            18 => OpCode::Input,
            19 => OpCode::Jump,
            20 => OpCode::JumpIfFalse,
            21 => OpCode::Loop,
            22 => OpCode::Return,
            outro => return Err(outro),
        })
    }
}
