use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strided_engine::{copy_into, sum, zip_map2_into, MemoryOrder, StridedArray, StridedArrayMut};

const N: usize = 512;

fn bench_contiguous_add(c: &mut Criterion) {
    let a_data: Vec<f64> = (0..N * N).map(|v| v as f64).collect();
    let b_data: Vec<f64> = (0..N * N).map(|v| (v / 2) as f64).collect();
    let mut out_data = vec![0.0; N * N];

    c.bench_function("add_contiguous_512x512", |bench| {
        bench.iter(|| {
            let a = StridedArray::new(
                &a_data,
                &[N, N],
                &[N as isize, 1],
                0,
                MemoryOrder::RowMajor,
            )
            .unwrap();
            let b = StridedArray::new(
                &b_data,
                &[N, N],
                &[N as isize, 1],
                0,
                MemoryOrder::RowMajor,
            )
            .unwrap();
            let mut out = StridedArrayMut::new(
                &mut out_data,
                &[N, N],
                &[N as isize, 1],
                0,
                MemoryOrder::RowMajor,
            )
            .unwrap();
            zip_map2_into(&mut out, &a, &b, |x, y| x + y).unwrap();
            black_box(&out_data[0]);
        })
    });
}

fn bench_transpose_copy(c: &mut Criterion) {
    let src_data: Vec<f64> = (0..N * N).map(|v| v as f64).collect();
    let mut dst_data = vec![0.0; N * N];

    c.bench_function("copy_transposed_512x512", |bench| {
        bench.iter(|| {
            // Source viewed transposed: forces the blocked strategy.
            let src = StridedArray::new(
                &src_data,
                &[N, N],
                &[1, N as isize],
                0,
                MemoryOrder::RowMajor,
            )
            .unwrap();
            let mut dst = StridedArrayMut::new(
                &mut dst_data,
                &[N, N],
                &[N as isize, 1],
                0,
                MemoryOrder::RowMajor,
            )
            .unwrap();
            copy_into(&mut dst, &src).unwrap();
            black_box(&dst_data[0]);
        })
    });
}

fn bench_strided_sum(c: &mut Criterion) {
    let data: Vec<f64> = (0..N * N).map(|v| v as f64).collect();

    c.bench_function("sum_every_other_column", |bench| {
        bench.iter(|| {
            let view = StridedArray::new(
                &data,
                &[N, N / 2],
                &[N as isize, 2],
                0,
                MemoryOrder::RowMajor,
            )
            .unwrap();
            black_box(sum(&view).unwrap());
        })
    });
}

criterion_group!(
    benches,
    bench_contiguous_add,
    bench_transpose_copy,
    bench_strided_sum
);
criterion_main!(benches);
