//! Resource apportionment
//!
//! Splits one host's processors and memory between the services it runs.
//! Steps run in a fixed order and record what they take in a ledger. The
//! processors and memory of the services colocated with Puppet Server are
//! decided up front, so its workers only get what those services leave.

use super::primitives::{clamp, clamp_percent_of_resource, fit_to_memory, nearest_power_of_two};
use super::settings::{keys, HeapSize, Params, SettingValue, SettingsResult, Totals, Usage};
use crate::system::HostResources;
use crate::topology::{InfrastructureShape, ServiceClass, ServiceClassSet};

/// Processors left to the operating system on master hosts
pub const RESERVED_PROCESSORS: u64 = 1;

/// Fewest Puppet Server workers a master host gets
pub const MINIMUM_WORKERS: u64 = 2;

/// Code cache reserved per worker in megabytes
pub const CODE_CACHE_PER_WORKER_MB: u64 = 128;

const CODE_CACHE_MIN_MB: u64 = 128;
const CODE_CACHE_MAX_MB: u64 = 2048;

/// Percentages applied to a host depending on whether it runs Puppet Server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostProfile {
    /// Puppet Server shares the host with other services
    Master,
    /// Host dedicated to console, PuppetDB or PostgreSQL
    Dedicated,
}

impl HostProfile {
    fn for_classes(classes: &ServiceClassSet) -> Self {
        if classes.contains(ServiceClass::Master) {
            Self::Master
        } else {
            Self::Dedicated
        }
    }
}

/// Inputs shared by every step
struct Plan<'a> {
    resources: &'a HostResources,
    classes: &'a ServiceClassSet,
    shape: &'a InfrastructureShape,
    profile: HostProfile,
    /// PuppetDB threads, decided up front so Puppet Server leaves room for them
    puppetdb_threads: u64,
    /// Memory taken by every service other than Puppet Server
    reserved_ram_mb: u64,
}

impl Plan<'_> {
    fn cpu(&self) -> u64 {
        u64::from(self.resources.cpu)
    }

    fn ram(&self) -> u64 {
        self.resources.ram_mb
    }

    /// Monolithic master that also serves agents through compile masters
    fn is_monolithic_with_compile_masters(&self) -> bool {
        self.shape.is_monolithic && self.shape.with_compile_masters
    }

    fn has(&self, class: ServiceClass) -> bool {
        self.classes.contains(class)
    }
}

/// Settings and resources accumulated so far
#[derive(Debug, Default)]
struct Ledger {
    params: Params,
    cpu_used: u64,
    ram_used: u64,
    mb_per_worker: Option<u64>,
}

impl Ledger {
    fn set(&mut self, key: &str, value: impl Into<SettingValue>) {
        self.params.insert(key.to_string(), value.into());
    }

    fn heap(&mut self, key: &str, mb: u64) {
        self.set(key, HeapSize::fixed(mb));
        self.ram_used = self.ram_used.saturating_add(mb);
    }

    fn reserve(&mut self, mb: u64) {
        self.ram_used = self.ram_used.saturating_add(mb);
    }
}

type Step = fn(&Plan<'_>, Ledger) -> Ledger;

const STEPS: [(ServiceClass, Step); 6] = [
    (ServiceClass::Master, master),
    (ServiceClass::Database, database),
    (ServiceClass::Puppetdb, puppetdb),
    (ServiceClass::Console, console),
    (ServiceClass::Broker, broker),
    (ServiceClass::Orchestrator, orchestrator),
];

/// Memory of one service other than Puppet Server, sized from the plan alone
type Reservation = fn(&Plan<'_>) -> u64;

const RESERVATIONS: [(ServiceClass, Reservation); 5] = [
    (ServiceClass::Database, shared_buffers_mb),
    (ServiceClass::Puppetdb, puppetdb_heap_mb),
    (ServiceClass::Console, console_heap_mb),
    (ServiceClass::Broker, broker_heap_mb),
    (ServiceClass::Orchestrator, orchestrator_heap_mb),
];

/// Recommend settings for the services `classes` on a host with `resources`.
///
/// Never fails: a host too small for its services still gets settings, and
/// [`crate::system::meets_minimum_requirements`] judges whether they are
/// acceptable.
pub fn apportion(
    resources: &HostResources,
    classes: &ServiceClassSet,
    shape: &InfrastructureShape,
) -> SettingsResult {
    let profile = HostProfile::for_classes(classes);
    let mut plan = Plan {
        resources,
        classes,
        shape,
        profile,
        puppetdb_threads: 0,
        reserved_ram_mb: 0,
    };
    if plan.has(ServiceClass::Puppetdb) {
        plan.puppetdb_threads = puppetdb_threads(&plan);
    }
    plan.reserved_ram_mb = RESERVATIONS
        .iter()
        .filter(|(class, _)| plan.has(*class))
        .fold(0u64, |total, (_, size)| total.saturating_add(size(&plan)));

    let ledger = STEPS
        .iter()
        .filter(|(class, _)| plan.has(*class))
        .fold(Ledger::default(), |ledger, (_, step)| step(&plan, ledger));

    SettingsResult {
        params: ledger.params,
        totals: Totals {
            cpu: Usage {
                total: plan.cpu(),
                used: ledger.cpu_used,
            },
            ram: Usage {
                total: plan.ram(),
                used: ledger.ram_used,
            },
            mb_per_worker: ledger.mb_per_worker,
        },
    }
}

fn puppetdb_threads(plan: &Plan<'_>) -> u64 {
    let cpu = plan.cpu();
    let ceiling = cpu.saturating_sub(1).max(1);
    match plan.profile {
        HostProfile::Master => {
            let percent = if plan.is_monolithic_with_compile_masters() { 75 } else { 25 };
            clamp_percent_of_resource(cpu, percent, 2, ceiling)
        }
        HostProfile::Dedicated => clamp_percent_of_resource(cpu, 75, 1, ceiling),
    }
}

fn shared_buffers_mb(plan: &Plan<'_>) -> u64 {
    clamp_percent_of_resource(plan.ram(), 25, 128, 16384)
}

fn puppetdb_heap_mb(plan: &Plan<'_>) -> u64 {
    match plan.profile {
        HostProfile::Master => {
            let percent = if plan.is_monolithic_with_compile_masters() { 20 } else { 10 };
            clamp_percent_of_resource(plan.ram(), percent, 512, 8192)
        }
        HostProfile::Dedicated => {
            let percent = if plan.has(ServiceClass::Database) { 25 } else { 50 };
            clamp_percent_of_resource(plan.ram(), percent, 512, 16384)
        }
    }
}

fn console_heap_mb(plan: &Plan<'_>) -> u64 {
    match plan.profile {
        HostProfile::Master => fit_to_memory(plan.ram(), 512, 768, 1024),
        HostProfile::Dedicated => {
            let percent = if plan.has(ServiceClass::Puppetdb) { 25 } else { 50 };
            clamp_percent_of_resource(plan.ram(), percent, 512, 8192)
        }
    }
}

fn broker_heap_mb(plan: &Plan<'_>) -> u64 {
    fit_to_memory(plan.ram(), 512, 1024, 2048)
}

fn orchestrator_heap_mb(plan: &Plan<'_>) -> u64 {
    fit_to_memory(plan.ram(), 512, 768, 1024)
}

fn code_cache_mb(workers: u64) -> u64 {
    clamp(
        nearest_power_of_two(workers.saturating_mul(CODE_CACHE_PER_WORKER_MB)),
        CODE_CACHE_MIN_MB,
        CODE_CACHE_MAX_MB,
    )
}

fn master(plan: &Plan<'_>, mut ledger: Ledger) -> Ledger {
    let cpu_workers = plan
        .cpu()
        .saturating_sub(RESERVED_PROCESSORS)
        .saturating_sub(plan.puppetdb_threads);

    // Memory left once every colocated service has its share
    let free_ram = plan.ram().saturating_sub(plan.reserved_ram_mb);
    let mb_per_worker: u64 = fit_to_memory(plan.ram(), 512, 768, 1024);
    let code_cache_per_worker = if plan.shape.with_code_cache {
        CODE_CACHE_PER_WORKER_MB
    } else {
        0
    };
    let ram_workers = free_ram / (mb_per_worker + code_cache_per_worker);

    let mut workers = cpu_workers.min(ram_workers).max(MINIMUM_WORKERS);

    let mut code_cache = 0;
    if plan.shape.with_code_cache {
        code_cache = code_cache_mb(workers);
        // rounding the cache to a power of two can overshoot what is free
        while workers > MINIMUM_WORKERS
            && workers
                .saturating_mul(mb_per_worker)
                .saturating_add(code_cache)
                > free_ram
        {
            workers -= 1;
            code_cache = code_cache_mb(workers);
        }
        ledger.set(
            keys::MASTER_RESERVED_CODE_CACHE,
            SettingValue::Text(format!("{}m", code_cache)),
        );
        ledger.reserve(code_cache);
        tracing::debug!("Reserved {} MB code cache", code_cache);
    }

    let mut heap = workers.saturating_mul(mb_per_worker);
    if plan.shape.is_monolithic && !plan.shape.with_compile_masters {
        let floor: u64 = fit_to_memory(plan.ram(), 2048, 3072, 4096);
        heap = heap.max(floor.min(free_ram.saturating_sub(code_cache)));
    }

    ledger.set(keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES, workers);
    ledger.heap(keys::MASTER_JAVA_ARGS, heap);
    ledger.cpu_used += workers;
    ledger.mb_per_worker = Some(mb_per_worker);

    tracing::debug!(
        "Puppet Server: {} worker(s) ({} by CPU, {} by RAM), {} MB heap, {} MB left by other services",
        workers,
        cpu_workers,
        ram_workers,
        heap,
        free_ram
    );
    ledger
}

fn database(plan: &Plan<'_>, mut ledger: Ledger) -> Ledger {
    let shared_buffers = shared_buffers_mb(plan);
    ledger.set(
        keys::DATABASE_SHARED_BUFFERS,
        SettingValue::Text(format!("{}MB", shared_buffers)),
    );
    ledger.reserve(shared_buffers);
    tracing::debug!("PostgreSQL: {} MB shared buffers", shared_buffers);
    ledger
}

fn puppetdb(plan: &Plan<'_>, mut ledger: Ledger) -> Ledger {
    let heap = puppetdb_heap_mb(plan);
    ledger.set(keys::PUPPETDB_COMMAND_PROCESSING_THREADS, plan.puppetdb_threads);
    ledger.heap(keys::PUPPETDB_JAVA_ARGS, heap);
    ledger.cpu_used += plan.puppetdb_threads;
    tracing::debug!(
        "PuppetDB: {} thread(s), {} MB heap",
        plan.puppetdb_threads,
        heap
    );
    ledger
}

fn console(plan: &Plan<'_>, mut ledger: Ledger) -> Ledger {
    let heap = console_heap_mb(plan);
    ledger.heap(keys::CONSOLE_JAVA_ARGS, heap);
    tracing::debug!("Console: {} MB heap", heap);
    ledger
}

fn broker(plan: &Plan<'_>, mut ledger: Ledger) -> Ledger {
    let heap = broker_heap_mb(plan);
    ledger.set(keys::BROKER_HEAP_MB, heap);
    ledger.reserve(heap);
    tracing::debug!("Broker: {} MB heap", heap);
    ledger
}

fn orchestrator(plan: &Plan<'_>, mut ledger: Ledger) -> Ledger {
    let heap = orchestrator_heap_mb(plan);
    ledger.heap(keys::ORCHESTRATOR_JAVA_ARGS, heap);
    tracing::debug!("Orchestrator: {} MB heap", heap);
    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MONOLITHIC: [ServiceClass; 7] = [
        ServiceClass::Master,
        ServiceClass::Console,
        ServiceClass::Puppetdb,
        ServiceClass::Database,
        ServiceClass::Broker,
        ServiceClass::Orchestrator,
        ServiceClass::PrimaryMaster,
    ];

    fn mono() -> InfrastructureShape {
        InfrastructureShape {
            is_monolithic: true,
            ..Default::default()
        }
    }

    fn split() -> InfrastructureShape {
        InfrastructureShape::default()
    }

    fn run(cpu: u32, ram_mb: u64, classes: &[ServiceClass], shape: InfrastructureShape) -> SettingsResult {
        let classes: ServiceClassSet = classes.iter().copied().collect();
        apportion(&HostResources { cpu, ram_mb }, &classes, &shape)
    }

    fn integer(result: &SettingsResult, key: &str) -> u64 {
        match result.params.get(key) {
            Some(SettingValue::Integer(n)) => *n,
            other => panic!("{} is not an integer: {:?}", key, other),
        }
    }

    fn heap(result: &SettingsResult, key: &str) -> u64 {
        match result.params.get(key) {
            Some(SettingValue::Heap(heap)) => {
                assert_eq!(heap.min_mb, heap.max_mb, "{} heap is not fixed", key);
                heap.max_mb
            }
            other => panic!("{} is not a heap: {:?}", key, other),
        }
    }

    fn text<'a>(result: &'a SettingsResult, key: &str) -> &'a str {
        match result.params.get(key) {
            Some(SettingValue::Text(s)) => s,
            other => panic!("{} is not text: {:?}", key, other),
        }
    }

    fn used(result: &SettingsResult) -> (u64, u64) {
        (result.totals.cpu.used, result.totals.ram.used)
    }

    #[test]
    fn test_monolithic_small() {
        let result = run(4, 8192, &MONOLITHIC, mono());

        assert_eq!(heap(&result, keys::MASTER_JAVA_ARGS), 2048);
        assert_eq!(integer(&result, keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES), 2);
        assert_eq!(integer(&result, keys::PUPPETDB_COMMAND_PROCESSING_THREADS), 2);
        assert_eq!(heap(&result, keys::PUPPETDB_JAVA_ARGS), 819);
        assert_eq!(text(&result, keys::DATABASE_SHARED_BUFFERS), "2048MB");
        assert_eq!(heap(&result, keys::CONSOLE_JAVA_ARGS), 512);
        assert_eq!(heap(&result, keys::ORCHESTRATOR_JAVA_ARGS), 512);
        assert_eq!(integer(&result, keys::BROKER_HEAP_MB), 512);
        assert_eq!(used(&result), (4, 6451));
        assert_eq!(result.totals.cpu.total, 4);
        assert_eq!(result.totals.ram.total, 8192);
        assert_eq!(result.totals.mb_per_worker, Some(512));
        assert!(!result.params.contains_key(keys::MASTER_RESERVED_CODE_CACHE));
    }

    #[test]
    fn test_monolithic_medium() {
        let result = run(8, 16384, &MONOLITHIC, mono());

        assert_eq!(integer(&result, keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES), 5);
        assert_eq!(heap(&result, keys::MASTER_JAVA_ARGS), 3840);
        assert_eq!(integer(&result, keys::PUPPETDB_COMMAND_PROCESSING_THREADS), 2);
        assert_eq!(heap(&result, keys::PUPPETDB_JAVA_ARGS), 1638);
        assert_eq!(text(&result, keys::DATABASE_SHARED_BUFFERS), "4096MB");
        assert_eq!(heap(&result, keys::CONSOLE_JAVA_ARGS), 768);
        assert_eq!(heap(&result, keys::ORCHESTRATOR_JAVA_ARGS), 768);
        assert_eq!(integer(&result, keys::BROKER_HEAP_MB), 1024);
        assert_eq!(used(&result), (7, 12134));
        assert_eq!(result.totals.mb_per_worker, Some(768));
    }

    #[test]
    fn test_monolithic_large() {
        let result = run(16, 32768, &MONOLITHIC, mono());

        assert_eq!(integer(&result, keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES), 11);
        assert_eq!(heap(&result, keys::MASTER_JAVA_ARGS), 11264);
        assert_eq!(integer(&result, keys::PUPPETDB_COMMAND_PROCESSING_THREADS), 4);
        assert_eq!(heap(&result, keys::PUPPETDB_JAVA_ARGS), 3276);
        assert_eq!(text(&result, keys::DATABASE_SHARED_BUFFERS), "8192MB");
        assert_eq!(heap(&result, keys::CONSOLE_JAVA_ARGS), 1024);
        assert_eq!(heap(&result, keys::ORCHESTRATOR_JAVA_ARGS), 1024);
        assert_eq!(integer(&result, keys::BROKER_HEAP_MB), 2048);
        assert_eq!(used(&result), (15, 26828));
        assert_eq!(result.totals.mb_per_worker, Some(1024));
    }

    #[test]
    fn test_monolithic_with_compile_masters() {
        let shape = InfrastructureShape {
            is_monolithic: true,
            with_compile_masters: true,
            ..Default::default()
        };
        let result = run(4, 8192, &MONOLITHIC, shape);

        assert_eq!(integer(&result, keys::PUPPETDB_COMMAND_PROCESSING_THREADS), 3);
        assert_eq!(integer(&result, keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES), 2);
        assert_eq!(heap(&result, keys::MASTER_JAVA_ARGS), 1024);
        assert_eq!(heap(&result, keys::PUPPETDB_JAVA_ARGS), 1638);
        assert_eq!(used(&result), (5, 6246));
    }

    #[test]
    fn test_monolithic_with_external_database() {
        let classes: Vec<_> = MONOLITHIC
            .iter()
            .copied()
            .filter(|class| *class != ServiceClass::Database)
            .collect();
        let shape = InfrastructureShape {
            with_external_database: true,
            ..mono()
        };
        let result = run(4, 8192, &classes, shape);

        assert!(!result.params.contains_key(keys::DATABASE_SHARED_BUFFERS));
        assert_eq!(used(&result), (4, 4403));
    }

    #[test]
    fn test_split_master() {
        let result = run(
            4,
            8192,
            &[ServiceClass::Master, ServiceClass::PrimaryMaster, ServiceClass::Orchestrator],
            split(),
        );

        assert_eq!(integer(&result, keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES), 3);
        assert_eq!(heap(&result, keys::MASTER_JAVA_ARGS), 1536);
        assert_eq!(heap(&result, keys::ORCHESTRATOR_JAVA_ARGS), 512);
        assert_eq!(used(&result), (3, 2048));
        assert_eq!(result.totals.mb_per_worker, Some(512));
    }

    #[test]
    fn test_console_host() {
        let result = run(4, 8192, &[ServiceClass::Console], split());

        assert_eq!(heap(&result, keys::CONSOLE_JAVA_ARGS), 4096);
        assert_eq!(result.params.len(), 1);
        assert_eq!(used(&result), (0, 4096));
        assert_eq!(result.totals.mb_per_worker, None);
    }

    #[test]
    fn test_puppetdb_host_with_database() {
        let result = run(4, 8192, &[ServiceClass::Puppetdb, ServiceClass::Database], split());

        assert_eq!(integer(&result, keys::PUPPETDB_COMMAND_PROCESSING_THREADS), 3);
        assert_eq!(heap(&result, keys::PUPPETDB_JAVA_ARGS), 2048);
        assert_eq!(text(&result, keys::DATABASE_SHARED_BUFFERS), "2048MB");
        assert_eq!(used(&result), (3, 4096));
        assert_eq!(result.totals.mb_per_worker, None);
    }

    #[test]
    fn test_puppetdb_host_without_database() {
        let result = run(4, 8192, &[ServiceClass::Puppetdb], split());

        assert_eq!(integer(&result, keys::PUPPETDB_COMMAND_PROCESSING_THREADS), 3);
        assert_eq!(heap(&result, keys::PUPPETDB_JAVA_ARGS), 4096);
        assert_eq!(used(&result), (3, 4096));
    }

    #[test]
    fn test_compile_master() {
        let shape = InfrastructureShape {
            with_compile_masters: true,
            ..Default::default()
        };
        let result = run(4, 8192, &[ServiceClass::Master, ServiceClass::CompileMaster], shape);

        assert_eq!(integer(&result, keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES), 3);
        assert_eq!(heap(&result, keys::MASTER_JAVA_ARGS), 1536);
        assert_eq!(used(&result), (3, 1536));
    }

    #[test]
    fn test_compile_master_with_puppetdb() {
        let shape = InfrastructureShape {
            with_compile_masters: true,
            ..Default::default()
        };
        let result = run(
            4,
            8192,
            &[ServiceClass::Master, ServiceClass::CompileMaster, ServiceClass::Puppetdb],
            shape,
        );

        assert_eq!(integer(&result, keys::PUPPETDB_COMMAND_PROCESSING_THREADS), 2);
        assert_eq!(heap(&result, keys::PUPPETDB_JAVA_ARGS), 819);
        assert_eq!(integer(&result, keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES), 2);
        assert_eq!(heap(&result, keys::MASTER_JAVA_ARGS), 1024);
        assert_eq!(used(&result), (4, 1843));
    }

    #[test]
    fn test_database_host() {
        let result = run(4, 8192, &[ServiceClass::Database], split());

        assert_eq!(text(&result, keys::DATABASE_SHARED_BUFFERS), "2048MB");
        assert_eq!(used(&result), (0, 2048));
    }

    #[test]
    fn test_code_cache() {
        let result = run(4, 8192, &MONOLITHIC, mono().with_code_cache(true));

        assert_eq!(text(&result, keys::MASTER_RESERVED_CODE_CACHE), "256m");
        assert_eq!(integer(&result, keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES), 2);
        assert_eq!(used(&result), (4, 6451 + 256));
    }

    #[test]
    fn test_tiny_host_still_gets_settings() {
        let result = run(1, 1024, &MONOLITHIC, mono());

        assert_eq!(integer(&result, keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES), MINIMUM_WORKERS);
        // the thread floor wins over the single processor
        assert_eq!(integer(&result, keys::PUPPETDB_COMMAND_PROCESSING_THREADS), 2);
        // no memory is left for a heap floor once the other services are sized
        assert_eq!(heap(&result, keys::MASTER_JAVA_ARGS), 2 * 512);
        assert!(result.totals.ram.is_overcommitted());
    }

    #[test]
    fn test_many_processors_little_memory() {
        for cpu in [12, 16, 24] {
            let result = run(cpu, 8192, &MONOLITHIC, mono());

            assert_eq!(integer(&result, keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES), 7);
            assert_eq!(heap(&result, keys::MASTER_JAVA_ARGS), 7 * 512);
            assert_eq!(result.totals.ram.used, 7987);
            assert!(!result.totals.ram.is_overcommitted());
        }
    }

    #[test]
    fn test_heap_floor_yields_to_colocated_services() {
        let result = run(4, 8193, &MONOLITHIC, mono());

        assert_eq!(heap(&result, keys::MASTER_JAVA_ARGS), 8193 - 5427);
        assert_eq!(result.totals.ram.used, 8193);
    }

    #[test]
    fn test_huge_host_does_not_overflow() {
        let result = run(u32::MAX, u64::MAX, &MONOLITHIC, mono().with_code_cache(true));

        assert_eq!(text(&result, keys::DATABASE_SHARED_BUFFERS), "16384MB");
        assert_eq!(heap(&result, keys::PUPPETDB_JAVA_ARGS), 8192);
        assert_eq!(text(&result, keys::MASTER_RESERVED_CODE_CACHE), "2048m");
        assert!(!result.totals.ram.is_overcommitted());
    }

    #[test]
    fn test_no_services_no_settings() {
        let result = run(4, 8192, &[ServiceClass::PrimaryMasterReplica], split());
        assert!(result.params.is_empty());
        assert_eq!(used(&result), (0, 0));
    }

    proptest! {
        #[test]
        fn prop_heaps_are_fixed_and_counted(cpu in 1u32..64, ram_mb in 1024u64..131_072) {
            let result = run(cpu, ram_mb, &MONOLITHIC, mono());
            let heaps: u64 = result
                .params
                .values()
                .filter_map(|value| match value {
                    SettingValue::Heap(heap) => {
                        assert_eq!(heap.min_mb, heap.max_mb);
                        Some(heap.max_mb)
                    }
                    _ => None,
                })
                .sum();
            let broker = integer(&result, keys::BROKER_HEAP_MB);
            let buffers: u64 = text(&result, keys::DATABASE_SHARED_BUFFERS)
                .trim_end_matches("MB")
                .parse()
                .unwrap();
            prop_assert_eq!(result.totals.ram.used, heaps + broker + buffers);
            prop_assert!(integer(&result, keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES) >= MINIMUM_WORKERS);
        }

        #[test]
        fn prop_supported_hosts_are_not_overcommitted(
            cpu in 1u32..64,
            ram_mb in 1024u64..131_072,
            with_compile_masters in any::<bool>(),
            with_code_cache in any::<bool>(),
            layout in 0usize..5,
        ) {
            let classes: &[ServiceClass] = match layout {
                0 => &MONOLITHIC,
                1 => &[ServiceClass::Master, ServiceClass::PrimaryMaster, ServiceClass::Orchestrator],
                2 => &[ServiceClass::Master, ServiceClass::CompileMaster, ServiceClass::Puppetdb],
                3 => &[ServiceClass::Puppetdb, ServiceClass::Database],
                _ => &[ServiceClass::Console, ServiceClass::Puppetdb],
            };
            let shape = InfrastructureShape {
                is_monolithic: layout == 0,
                with_compile_masters,
                with_code_cache,
                ..Default::default()
            };
            let resources = HostResources { cpu, ram_mb };
            let result = run(cpu, ram_mb, classes, shape);

            if crate::system::meets_minimum_requirements(&resources, false) {
                prop_assert!(
                    result.totals.ram.used <= result.totals.ram.total,
                    "RAM overcommitted: {} > {}",
                    result.totals.ram.used,
                    result.totals.ram.total
                );
            }
        }
    }
}
