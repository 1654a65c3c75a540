pub(crate) use super::*;

#[test]
fn test_from_vec() {
    let m: Matrix<f64> = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        .expect("test data has correct dimensions: 2*3=6 elements");
    assert_eq!(m.shape(), (2, 3));
    assert!((m.get(0, 0) - 1.0).abs() < 1e-12);
    assert!((m.get(1, 2) - 6.0).abs() < 1e-12);
}

#[test]
fn test_from_vec_error() {
    let result = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0]);
    assert!(result.is_err());
}

#[test]
fn test_zeros() {
    let m = Matrix::zeros(2, 3);
    assert_eq!(m.shape(), (2, 3));
    assert!(m.as_slice().iter().all(|&x| x == 0.0));
}

#[test]
fn test_from_columns() {
    let m = Matrix::from_columns(&[vec![1.0, 2.0], vec![3.0, 4.0]]).expect("equal columns");
    assert_eq!(m.shape(), (2, 2));
    assert_eq!(m.row(0), &[1.0, 3.0]);
    assert_eq!(m.column(1), vec![3.0, 4.0]);
}

#[test]
fn test_from_columns_ragged() {
    assert!(Matrix::from_columns(&[vec![1.0, 2.0], vec![3.0]]).is_err());
}

#[test]
fn test_select_columns_reorders() {
    let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("valid");
    let s = m.select_columns(&[2, 0]).expect("in range");
    assert_eq!(s.shape(), (2, 2));
    assert_eq!(s.as_slice(), &[3.0, 1.0, 6.0, 4.0]);
    assert!(m.select_columns(&[3]).is_err());
}

#[test]
fn test_select_rows() {
    let m = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).expect("valid");
    let s = m.select_rows(&[2, 0]).expect("in range");
    assert_eq!(s.as_slice(), &[3.0, 1.0]);
    assert!(m.select_rows(&[5]).is_err());
}

#[test]
fn test_write_columns() {
    let mut table = Matrix::zeros(2, 3);
    let block = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).expect("valid");
    table.write_columns(1, &block).expect("fits");
    assert_eq!(table.as_slice(), &[0.0, 1.0, 2.0, 0.0, 3.0, 4.0]);
    assert!(table.write_columns(2, &block).is_err());
}

#[test]
fn test_reshape() {
    let m = Matrix::from_vec(1, 4, vec![1.0, 2.0, 3.0, 4.0]).expect("valid");
    let r = m.reshape(4, 1).expect("same size");
    assert_eq!(r.shape(), (4, 1));
}

#[test]
fn test_bit_eq_nan() {
    let a = Matrix::from_vec(1, 2, vec![f64::NAN, 1.0]).expect("valid");
    let b = a.clone();
    assert_ne!(a, b);
    assert!(a.bit_eq(&b));
}
