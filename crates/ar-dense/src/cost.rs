use ar_tensor::Shape;

/// Operation count reported to profilers: `3 * inner_size` per output element,
/// summed over every output.
pub fn estimate_flops(inner_size: usize, outputs: &[Shape]) -> u64 {
    outputs
        .iter()
        .map(|shape| 3 * inner_size as u64 * shape.numel() as u64)
        .sum()
}
