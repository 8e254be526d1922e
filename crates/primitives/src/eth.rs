use crate::felt::Felt252;
use crate::macros::bounded_felt;

/// 2^160
const ETH_ADDRESS_BOUND: Felt252 = Felt252::from_raw([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
]);

bounded_felt! {
    /// An Ethereum (L1) address carried as a single felt.
    EthAddress, bound = ETH_ADDRESS_BOUND, display = "eth address"
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use num_traits::One;

    use super::*;

    #[test]
    fn bound_is_two_pow_160() {
        assert_eq!(ETH_ADDRESS_BOUND.to_biguint(), BigUint::one() << 160u32);
        assert!(EthAddress::from_hex("0xd8da6bf26964af9d7eed9e03e53415d37aa96045").is_ok());
        assert!(EthAddress::new(ETH_ADDRESS_BOUND).is_err());
    }
}
