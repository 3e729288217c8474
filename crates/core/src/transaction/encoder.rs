use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
    json_abi::Function,
};
use thiserror::Error;

use super::types::TransactionData;

#[derive(Error, Debug)]
pub enum EncodeContractCallError {
    #[error("Invalid function signature {0}: {1}")]
    InvalidSignature(String, String),

    #[error("Function {signature} takes {expected} arguments but {given} were given")]
    ArgumentCountMismatch { signature: String, expected: usize, given: usize },

    #[error("Argument {index} of {signature} could not be read as {ty}: {reason}")]
    InvalidArgument { signature: String, index: usize, ty: String, reason: String },

    #[error("Could not ABI encode call to {0}: {1}")]
    EncodeFailed(String, String),
}

/// ABI encodes a call to `signature` (e.g. `recordConsent(address,bytes32,bool)`) with the
/// given arguments, each written the way a human would type it.
///
/// # Arguments
/// * `signature` - Solidity function signature, without return types
/// * `args` - One string per parameter, coerced to the parameter type
///
/// # Returns
/// * `Ok(TransactionData)` - 4 byte selector followed by the encoded arguments
/// * `Err(EncodeContractCallError)` - If the signature or any argument is invalid
pub fn encode_contract_call<S: AsRef<str>>(
    signature: &str,
    args: &[S],
) -> Result<TransactionData, EncodeContractCallError> {
    let function = Function::parse(signature).map_err(|e| {
        EncodeContractCallError::InvalidSignature(signature.to_string(), e.to_string())
    })?;

    if function.inputs.len() != args.len() {
        return Err(EncodeContractCallError::ArgumentCountMismatch {
            signature: signature.to_string(),
            expected: function.inputs.len(),
            given: args.len(),
        });
    }

    let mut values: Vec<DynSolValue> = Vec::with_capacity(args.len());
    for (index, (param, arg)) in function.inputs.iter().zip(args).enumerate() {
        let invalid = |reason: String| EncodeContractCallError::InvalidArgument {
            signature: signature.to_string(),
            index,
            ty: param.ty.clone(),
            reason,
        };

        let ty = param.resolve().map_err(|e| invalid(e.to_string()))?;
        values.push(ty.coerce_str(arg.as_ref()).map_err(|e| invalid(e.to_string()))?);
    }

    let encoded = function.abi_encode_input(&values).map_err(|e| {
        EncodeContractCallError::EncodeFailed(signature.to_string(), e.to_string())
    })?;

    Ok(TransactionData::from(encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_selector_and_arguments() {
        let data = encode_contract_call(
            "transfer(address,uint256)",
            &["0x46988ba8250e009dcc5df543d78e2277e2aa900b", "1"],
        )
        .unwrap();

        let bytes = data.into_inner();
        assert_eq!(bytes.len(), 4 + 32 + 32);
        assert_eq!(&bytes[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(bytes[4 + 32 + 31], 1);
    }

    #[test]
    fn test_argument_count_must_match() {
        let result = encode_contract_call("recordConsent(address,bool)", &["0x01"]);
        assert!(matches!(
            result,
            Err(EncodeContractCallError::ArgumentCountMismatch { expected: 2, given: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_unparseable_argument() {
        let result = encode_contract_call("revokeConsent(uint256)", &["not-a-number"]);
        assert!(matches!(result, Err(EncodeContractCallError::InvalidArgument { index: 0, .. })));
    }

    #[test]
    fn test_rejects_bad_signature() {
        let result = encode_contract_call("recordConsent(address", &["0x01"]);
        assert!(matches!(result, Err(EncodeContractCallError::InvalidSignature(_, _))));
    }
}
