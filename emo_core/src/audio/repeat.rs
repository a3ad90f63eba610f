use ndarray::{Array2, Axis};

use crate::error::FeatureError;

/// Pads a frame sequence to `target_len` rows by repeating it from the start.
///
/// With `L` input frames and `L < target_len`, the output is the input, then
/// `target_len / L - 1` more full copies, then the first `target_len % L`
/// frames. Inputs with `L >= target_len` are returned unchanged; nothing is
/// truncated, so long inputs keep their length.
pub fn repeat_to_length(frames: &Array2<f32>, target_len: usize) -> Result<Array2<f32>, FeatureError> {
    let len = frames.nrows();
    if len >= target_len {
        return Ok(frames.clone());
    }
    if len == 0 {
        return Err(FeatureError::EmptyFrames);
    }

    let rows: Vec<usize> = (0..target_len).map(|i| i % len).collect();
    Ok(frames.select(Axis(0), &rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, s};

    fn ramp(rows: usize, cols: usize) -> Array2<f32> {
        Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as f32)
    }

    #[test]
    fn three_frames_to_seven() {
        let input = array![[1.0f32, 10.0], [2.0, 20.0], [3.0, 30.0]];
        let out = repeat_to_length(&input, 7).unwrap();
        let expected = array![
            [1.0f32, 10.0],
            [2.0, 20.0],
            [3.0, 30.0],
            [1.0, 10.0],
            [2.0, 20.0],
            [3.0, 30.0],
            [1.0, 10.0],
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn prefix_repetition_law() {
        let input = ramp(5, 4);
        for target in [6, 10, 11, 23] {
            let out = repeat_to_length(&input, target).unwrap();
            assert_eq!(out.nrows(), target);
            assert_eq!(out.slice(s![0..5, ..]), input);
            if 2 * 5 <= target {
                assert_eq!(out.slice(s![5..10, ..]), input);
            }
        }
    }

    #[test]
    fn long_input_is_untouched() {
        let input = ramp(9, 3);
        assert_eq!(repeat_to_length(&input, 4).unwrap(), input);
        assert_eq!(repeat_to_length(&input, 9).unwrap(), input);
    }

    #[test]
    fn empty_input_is_an_error() {
        let input = Array2::<f32>::zeros((0, 8));
        assert!(matches!(repeat_to_length(&input, 4), Err(FeatureError::EmptyFrames)));
    }
}
