use serde::{Deserialize, Serialize};

use super::opcode::OpCode;
use crate::valor::Valor;

/// O programa compilado: o fluxo de bytes das instruções, o mapa de linhas
/// (uma entrada POR BYTE, não por instrução) e o pool de constantes.
///
/// O chunk só é mutado pelo compilador; depois de devolvido ele é tratado
/// como congelado e compartilhado entre a VM e o desmontador.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub code: Vec<u8>,
    pub lines: Vec<usize>,
    pub constants: Vec<Valor>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anexa um byte (opcode ou operando) e a linha de origem responsável.
    pub fn write(&mut self, byte: u8, line: usize) {
        self.code.push(byte);
        self.lines.push(line);
    }

    pub fn write_op(&mut self, op: OpCode, line: usize) {
        self.write(op as u8, line);
    }

    /// Acrescenta um valor ao pool e devolve o índice. Literais repetidos
    /// ganham entradas novas; não há deduplicação.
    pub fn add_constant(&mut self, valor: Valor) -> usize {
        self.constants.push(valor);
        self.constants.len() - 1
    }

    /// Codifica o chunk para gravação em um arquivo `.pbc`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrita_mantem_mapa_de_linhas_paralelo() {
        let mut chunk = Chunk::new();
        let indice = chunk.add_constant(Valor::Inteiro(7));
        chunk.write_op(OpCode::Constant, 3);
        chunk.write(indice as u8, 3);
        chunk.write_op(OpCode::Return, 0);

        assert_eq!(chunk.code, vec![OpCode::Constant as u8, 0, OpCode::Return as u8]);
        assert_eq!(chunk.lines, vec![3, 3, 0]);
        assert_eq!(chunk.code.len(), chunk.lines.len());
    }

    #[test]
    fn pool_de_constantes_sem_deduplicacao() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.add_constant(Valor::Inteiro(1)), 0);
        assert_eq!(chunk.add_constant(Valor::Inteiro(1)), 1);
        assert_eq!(chunk.constants.len(), 2);
    }

    #[test]
    fn chunk_sobrevive_ao_arquivo_pbc() {
        let mut chunk = Chunk::new();
        let indice = chunk.add_constant(Valor::Texto("x".to_string()));
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(indice as u8, 1);
        chunk.write_op(OpCode::Return, 0);

        let bytes = chunk.to_bytes().expect("codificação deveria funcionar");
        let relido = Chunk::from_bytes(&bytes).expect("decodificação deveria funcionar");
        assert_eq!(relido, chunk);
    }
}
