// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use gcrx::core::cpu::{Instruction, CPU};
use gcrx::core::memory::Memory;
use std::hint::black_box;

const CODE: u32 = 0x8000_3100;

/// ori r0, r0, 0
const NOP: u32 = 0x6000_0000;

/// Short integer loop body: addi, add, rlwinm, cmpw, xor
const ARITH: [u32; 5] = [0x3863_0001, 0x7C84_1A14, 0x54A5_103A, 0x7C03_2000, 0x7CC6_2278];

fn fill(memory: &mut Memory, words: &[u32], count: u32) {
    for i in 0..count {
        let word = words[(i as usize) % words.len()];
        memory.write_u32(CODE + i * 4, word).unwrap();
    }
}

fn cpu_step_benchmark(c: &mut Criterion) {
    c.bench_function("cpu_step", |b| {
        let mut cpu = CPU::new();
        let mut memory = Memory::new(false, false).unwrap();
        memory.write_u32(CODE, NOP).unwrap();

        b.iter(|| {
            cpu.set_pc(CODE);
            black_box(cpu.step(&memory));
        });
    });
}

fn cpu_register_access_benchmark(c: &mut Criterion) {
    c.bench_function("cpu_register_read", |b| {
        let cpu = CPU::new();
        b.iter(|| {
            for i in 0..32 {
                black_box(cpu.reg(i));
            }
        });
    });

    c.bench_function("cpu_register_write", |b| {
        let mut cpu = CPU::new();
        b.iter(|| {
            for i in 0..32 {
                cpu.set_reg(i, black_box(i as u32 * 100));
            }
        });
    });
}

fn decode_benchmark(c: &mut Criterion) {
    c.bench_function("decode_fields", |b| {
        b.iter(|| {
            for &word in ARITH.iter() {
                let inst = Instruction(black_box(word));
                black_box((inst.opcd(), inst.rd(), inst.ra(), inst.rb(), inst.subop10()));
            }
        });
    });
}

fn execute_block_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute_block");

    for size in [10u32, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("nop_sled", size), size, |b, &size| {
            let mut cpu = CPU::new();
            let mut memory = Memory::new(false, false).unwrap();
            fill(&mut memory, &[NOP], size);

            b.iter(|| {
                cpu.set_pc(CODE);
                black_box(cpu.execute_block(&memory, size));
            });
        });

        group.bench_with_input(BenchmarkId::new("arith_sled", size), size, |b, &size| {
            let mut cpu = CPU::new();
            let mut memory = Memory::new(false, false).unwrap();
            fill(&mut memory, &ARITH, size);

            b.iter(|| {
                cpu.set_pc(CODE);
                black_box(cpu.execute_block(&memory, size));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    cpu_step_benchmark,
    cpu_register_access_benchmark,
    decode_benchmark,
    execute_block_benchmark
);
criterion_main!(benches);
